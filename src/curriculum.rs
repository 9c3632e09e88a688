use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

pub const CONFIDENCE_THRESHOLD: i32 = 70;
pub const MASTERED_CONFIDENCE: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDef {
    pub key: String,
    pub label: String,
    pub tier: u8,
    pub prerequisites: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub invariant: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointProblem {
    pub tier: u8,
    pub title: String,
    pub description: String,
    pub required_patterns: Vec<String>,
}

/// Static curriculum configuration handed to the progression engine.
///
/// Tier membership is derived from each topic's `tier`, preserving the order
/// topics were declared in.
#[derive(Debug, Clone, Default)]
pub struct Curriculum {
    topics: Vec<TopicDef>,
    tiers: BTreeMap<u8, Vec<String>>,
    checkpoints: BTreeMap<u8, CheckpointProblem>,
    problems: HashMap<String, Vec<Problem>>,
}

impl Curriculum {
    pub fn new(
        topics: Vec<TopicDef>,
        checkpoints: Vec<CheckpointProblem>,
        problems: HashMap<String, Vec<Problem>>,
    ) -> Self {
        let mut tiers: BTreeMap<u8, Vec<String>> = BTreeMap::new();
        for topic in &topics {
            let members = tiers.entry(topic.tier).or_default();
            if !members.contains(&topic.key) {
                members.push(topic.key.clone());
            }
        }
        let checkpoints = checkpoints.into_iter().map(|c| (c.tier, c)).collect();

        Self {
            topics,
            tiers,
            checkpoints,
            problems,
        }
    }

    /// The 22-topic, 7-tier skill tree.
    pub fn standard() -> Self {
        let topics = STANDARD_TOPICS
            .iter()
            .map(|(key, label, tier, reqs)| TopicDef {
                key: key.to_string(),
                label: label.to_string(),
                tier: *tier,
                prerequisites: reqs.iter().map(|r| r.to_string()).collect(),
            })
            .collect();

        let checkpoints = STANDARD_CHECKPOINTS
            .iter()
            .map(|(tier, title, description, patterns)| CheckpointProblem {
                tier: *tier,
                title: title.to_string(),
                description: description.to_string(),
                required_patterns: patterns.iter().map(|p| p.to_string()).collect(),
            })
            .collect();

        let mut problems: HashMap<String, Vec<Problem>> = HashMap::new();
        for (topic, id, title, difficulty, invariant) in STANDARD_PROBLEMS {
            problems.entry(topic.to_string()).or_default().push(Problem {
                id: id.to_string(),
                title: title.to_string(),
                difficulty: *difficulty,
                invariant: invariant.to_string(),
            });
        }

        Self::new(topics, checkpoints, problems)
    }

    pub fn topics(&self) -> &[TopicDef] {
        &self.topics
    }

    pub fn topic(&self, key: &str) -> Option<&TopicDef> {
        self.topics.iter().find(|t| t.key == key)
    }

    pub fn topic_keys(&self) -> Vec<String> {
        self.topics.iter().map(|t| t.key.clone()).collect()
    }

    pub fn tiers(&self) -> impl Iterator<Item = u8> + '_ {
        self.tiers.keys().copied()
    }

    pub fn has_tier(&self, tier: u8) -> bool {
        self.tiers.contains_key(&tier)
    }

    pub fn tier_topics(&self, tier: u8) -> &[String] {
        self.tiers.get(&tier).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn checkpoint(&self, tier: u8) -> Option<&CheckpointProblem> {
        self.checkpoints.get(&tier)
    }

    pub fn problem(&self, topic: &str, problem_id: &str) -> Option<&Problem> {
        self.problems
            .get(topic)
            .and_then(|list| list.iter().find(|p| p.id == problem_id))
    }
}

type TopicRow = (&'static str, &'static str, u8, &'static [&'static str]);
type CheckpointRow = (u8, &'static str, &'static str, &'static [&'static str]);
type ProblemRow = (
    &'static str,
    &'static str,
    &'static str,
    Difficulty,
    &'static str,
);

const STANDARD_TOPICS: &[TopicRow] = &[
    ("ARRAY_SCAN", "Array Memory", 0, &[]),
    ("RECURSION_ROOTS", "Recursion Core", 0, &[]),
    ("SORTING", "Sorting", 1, &["ARRAY_SCAN"]),
    ("HASHING", "Hashing", 1, &["ARRAY_SCAN"]),
    ("STACKS", "Stacks (LIFO)", 1, &["ARRAY_SCAN"]),
    ("PREFIX_SUM", "Prefix Sums", 2, &["ARRAY_SCAN"]),
    ("TWO_POINTERS", "Two Pointers", 2, &["SORTING"]),
    ("QUEUES", "Queues (FIFO)", 2, &["STACKS"]),
    ("LINKED_LISTS", "Linked Lists", 2, &["ARRAY_SCAN", "RECURSION_ROOTS"]),
    ("SLIDING_WINDOW", "Sliding Window", 3, &["TWO_POINTERS", "HASHING"]),
    ("BINARY_SEARCH", "Binary Search", 3, &["SORTING"]),
    ("MONOTONIC_STACK", "Monotonic Stack", 3, &["STACKS"]),
    ("BINARY_TREES", "Binary Trees", 4, &["RECURSION_ROOTS", "QUEUES"]),
    ("INTERVALS", "Intervals", 4, &["SORTING", "GREEDY"]),
    ("GREEDY", "Greedy", 4, &["SORTING"]),
    ("DFS_BFS", "Graph Search", 5, &["BINARY_TREES", "HASHING", "STACKS", "QUEUES"]),
    ("BACKTRACKING", "Backtracking", 5, &["RECURSION_ROOTS"]),
    ("TRIES", "Tries", 5, &["HASHING", "BINARY_TREES"]),
    ("DYNAMIC_PROGRAMMING", "Dynamic Prog", 5, &["RECURSION_ROOTS"]),
    ("TOPOLOGICAL_SORT", "Topo Sort", 6, &["DFS_BFS"]),
    ("UNION_FIND", "Union Find", 6, &["DFS_BFS", "ARRAY_SCAN"]),
    ("BIT_MANIPULATION", "Bitwise Logic", 6, &["ARRAY_SCAN"]),
];

const STANDARD_CHECKPOINTS: &[CheckpointRow] = &[
    (
        0,
        "Subsets Generator",
        "Generate all subsets (power set) using recursion and array iteration",
        &["Array Iteration", "Recursive Backtracking"],
    ),
    (
        1,
        "Interval Merger with Validation",
        "Merge overlapping intervals with hash deduplication and stack validation",
        &["Sorting", "Hashing", "Stack"],
    ),
    (
        2,
        "Maximum Subarray with Constraints",
        "Maximum sum subarray with prefix sum optimization and sliding window",
        &["Prefix Sum", "Sliding Window", "Queue"],
    ),
    (
        3,
        "Largest Rectangle in Histogram",
        "Largest rectangle in histogram using binary search and monotonic stack",
        &["Binary Search", "Monotonic Stack", "Sliding Window"],
    ),
    (
        4,
        "Non-overlapping Intervals in Tree",
        "Maximum non-overlapping intervals in binary tree with greedy selection",
        &["Tree Traversal", "Interval Merging", "Greedy"],
    ),
    (
        5,
        "Word Search II",
        "Word Search II using Trie construction, DFS traversal, and backtracking",
        &["Trie", "DFS", "Backtracking"],
    ),
    (
        6,
        "Course Schedule with Prerequisites",
        "Course scheduling with topological sort, union-find, and bitmask states",
        &["Topological Sort", "Union-Find", "Bit Manipulation"],
    ),
];

use Difficulty::{Easy, Medium};

const STANDARD_PROBLEMS: &[ProblemRow] = &[
    ("ARRAY_SCAN", "run_sum", "Running Sum of 1d Array", Easy, "State: prev_sum + curr."),
    ("ARRAY_SCAN", "prod_except", "Product of Array Except Self", Medium, "Two pass: Prefix * Suffix."),
    ("ARRAY_SCAN", "max_subarray", "Maximum Subarray (Kadane)", Medium, "Local max vs Global max."),
    ("RECURSION_ROOTS", "fib_num", "Fibonacci Number", Easy, "Base cases: 0 and 1."),
    ("RECURSION_ROOTS", "pow_x_n", "Pow(x, n)", Medium, "Divide & Conquer: x^n = x^(n/2) * x^(n/2)."),
    ("RECURSION_ROOTS", "gen_parens", "Generate Parentheses", Medium, "Balance state: open < n, close < open."),
    ("SORTING", "missing_num", "Missing Number", Easy, "Sum formula or cyclic sort logic."),
    ("SORTING", "sort_colors", "Sort Colors", Medium, "Dutch National Flag: 3-way partition."),
    ("SORTING", "kth_largest", "Kth Largest Element in an Array", Medium, "QuickSelect or Heap pivot logic."),
    ("HASHING", "contains_dup", "Contains Duplicate", Easy, "Set existence check."),
    ("HASHING", "group_anagrams", "Group Anagrams", Medium, "Key generation: sorted string or char count."),
    ("HASHING", "longest_consec", "Longest Consecutive Sequence", Medium, "Set check neighbors (n-1, n+1)."),
    ("STACKS", "valid_paren", "Valid Parentheses", Easy, "LIFO matching."),
    ("STACKS", "min_stack", "Min Stack", Medium, "Auxiliary stack for min state."),
    ("STACKS", "eval_rpn", "Evaluate Reverse Polish Notation", Medium, "Postfix evaluation using stack."),
    ("PREFIX_SUM", "range_sum", "Range Sum Query - Immutable", Easy, "Immutable P[i] array."),
    ("PREFIX_SUM", "sub_sum_k", "Subarray Sum Equals K", Medium, "Hash Map {sum: count} + Prefix."),
    ("PREFIX_SUM", "prod_less_k", "Subarray Product Less Than K", Medium, "Sliding window over product."),
    ("TWO_POINTERS", "valid_palin", "Valid Palindrome", Easy, "Converge from ends."),
    ("TWO_POINTERS", "two_sum_ii", "Two Sum II - Input Array Sorted", Medium, "Sorted input exploitation."),
    ("TWO_POINTERS", "3sum", "3Sum", Medium, "Fix one, 2-sum the rest. Skip duplicates."),
    ("QUEUES", "recent_calls", "Number of Recent Calls", Easy, "Slide window of time t-3000."),
    ("QUEUES", "stack_queues", "Implement Stack using Queues", Medium, "Double queue push/pop logic."),
    ("QUEUES", "dota2", "Dota2 Senate", Medium, "Round robin cyclic simulation."),
    ("LINKED_LISTS", "merge_sorted", "Merge Two Sorted Lists", Easy, "Dummy head + scanner."),
    ("LINKED_LISTS", "remove_nth", "Remove Nth Node From End of List", Medium, "Fast/Slow pointer gap."),
    ("LINKED_LISTS", "reorder_list", "Reorder List", Medium, "Find mid -> Reverse second half -> Merge."),
    ("SLIDING_WINDOW", "buy_sell_stock", "Best Time to Buy and Sell Stock", Easy, "Min_price tracking."),
    ("SLIDING_WINDOW", "longest_sub_no_rep", "Longest Substring Without Repeating Characters", Medium, "Map/Set for char index."),
    ("SLIDING_WINDOW", "min_window", "Minimum Window Substring", Medium, "Frequency map requirement match."),
    ("BINARY_SEARCH", "bin_search", "Binary Search", Easy, "Standard template."),
    ("BINARY_SEARCH", "search_2d", "Search 2D Matrix", Medium, "Treat 2D as 1D array logic."),
    ("BINARY_SEARCH", "rotated_min", "Find Minimum in Rotated Sorted Array", Medium, "Compare mid with right."),
    ("MONOTONIC_STACK", "next_greater_i", "Next Greater Element I", Easy, "Hash map + Mono Stack."),
    ("MONOTONIC_STACK", "daily_temps", "Daily Temperatures", Medium, "Store indices, compare values."),
    ("MONOTONIC_STACK", "asteroid_coll", "Asteroid Collision", Medium, "Collision rules on stack top."),
    ("BINARY_TREES", "max_depth", "Maximum Depth of Binary Tree", Easy, "DFS height calculation."),
    ("BINARY_TREES", "level_order", "Binary Tree Level Order Traversal", Medium, "BFS Queue size tracking."),
    ("BINARY_TREES", "validate_bst", "Validate Binary Search Tree", Medium, "Range (min, max) propagation."),
    ("INTERVALS", "attend_meetings", "Meeting Rooms", Easy, "Sort by start time."),
    ("INTERVALS", "insert_interval", "Insert Interval", Medium, "Skip, Merge, Append."),
    ("INTERVALS", "merge_intervals", "Merge Intervals", Medium, "Sort start, track end."),
    ("GREEDY", "assign_cookies", "Assign Cookies", Easy, "Sort greed + Sort size."),
    ("GREEDY", "jump_game", "Jump Game", Medium, "Max reachable index extension."),
    ("GREEDY", "gas_station", "Gas Station", Medium, "Total sum >= 0 check."),
    ("DFS_BFS", "flood_fill", "Flood Fill", Easy, "4-directional recursion."),
    ("DFS_BFS", "num_islands", "Number of Islands", Medium, "Sink visited land."),
    ("DFS_BFS", "rotting_oranges", "Rotting Oranges", Medium, "Multi-source BFS."),
    ("BACKTRACKING", "binary_watch", "Binary Watch", Easy, "Bit count or recursion."),
    ("BACKTRACKING", "permutations", "Permutations", Medium, "Used array/set state."),
    ("BACKTRACKING", "comb_sum", "Combination Sum", Medium, "Target reduction, index passing."),
    ("TRIES", "longest_common_prefix", "Longest Common Prefix", Easy, "Horizontal scan or Trie."),
    ("TRIES", "implement_trie", "Implement Trie (Prefix Tree)", Medium, "Node {children[26], isEnd}."),
    ("TRIES", "word_search_ii", "Word Search II", Medium, "Backtracking on Trie."),
    ("DYNAMIC_PROGRAMMING", "climb_stairs", "Climbing Stairs", Easy, "dp[i] = dp[i-1] + dp[i-2]."),
    ("DYNAMIC_PROGRAMMING", "house_robber", "House Robber", Medium, "Max(rob current, skip current)."),
    ("DYNAMIC_PROGRAMMING", "coin_change", "Coin Change", Medium, "Min coins for amount - coin."),
    ("TOPOLOGICAL_SORT", "find_judge", "Find the Town Judge", Easy, "In-degree vs Out-degree."),
    ("TOPOLOGICAL_SORT", "course_sched", "Course Schedule", Medium, "Cycle detection (DFS/Kahn)."),
    ("TOPOLOGICAL_SORT", "course_sched_ii", "Course Schedule II", Medium, "Order generation."),
    ("UNION_FIND", "valid_path", "Find if Path Exists in Graph", Easy, "Find(u) == Find(v)."),
    ("UNION_FIND", "num_provinces", "Number of Provinces", Medium, "Count distinct roots."),
    ("UNION_FIND", "redundant_conn", "Redundant Connection", Medium, "Cycle detection via Union."),
    ("BIT_MANIPULATION", "num_1_bits", "Number of 1 Bits", Easy, "n & (n-1) drops lowest set bit."),
    ("BIT_MANIPULATION", "single_num", "Single Number", Medium, "XOR self-inverse property."),
    ("BIT_MANIPULATION", "sum_two_int", "Sum of Two Integers", Medium, "XOR for sum, AND<<1 for carry."),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_shape() {
        let curriculum = Curriculum::standard();
        assert_eq!(curriculum.topics().len(), 22);
        assert_eq!(curriculum.tiers().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4, 5, 6]);
        for tier in 0..=6 {
            assert!(curriculum.checkpoint(tier).is_some());
            assert!(!curriculum.tier_topics(tier).is_empty());
        }
    }

    #[test]
    fn test_tier_zero_members() {
        let curriculum = Curriculum::standard();
        assert_eq!(curriculum.tier_topics(0), ["ARRAY_SCAN", "RECURSION_ROOTS"]);
        assert!(curriculum.tier_topics(9).is_empty());
    }

    #[test]
    fn test_every_topic_has_three_problems() {
        let curriculum = Curriculum::standard();
        for topic in curriculum.topics() {
            let count = STANDARD_PROBLEMS
                .iter()
                .filter(|(key, ..)| *key == topic.key)
                .count();
            assert_eq!(count, 3, "topic {}", topic.key);
        }
        assert!(curriculum.problem("HASHING", "group_anagrams").is_some());
        assert!(curriculum.problem("HASHING", "run_sum").is_none());
    }

    #[test]
    fn test_prerequisites_reference_known_topics() {
        let curriculum = Curriculum::standard();
        for topic in curriculum.topics() {
            for req in &topic.prerequisites {
                assert!(curriculum.topic(req).is_some(), "{} -> {}", topic.key, req);
            }
        }
    }

    #[test]
    fn test_duplicate_topic_declaration_counted_once() {
        let topic = TopicDef {
            key: "A".into(),
            label: "A".into(),
            tier: 0,
            prerequisites: Vec::new(),
        };
        let curriculum = Curriculum::new(vec![topic.clone(), topic], Vec::new(), HashMap::new());
        assert_eq!(curriculum.tier_topics(0), ["A"]);
    }
}
