//! Built-in demo graph: generate numbers, keep the even ones, sum them.

use crate::{Edge, GraphStore, Node, Position, SubstitutionRule};

/// Placeholder in node 3's script that receives node 2's `even_numbers`.
pub const EVEN_NUMBERS_PLACEHOLDER: &str = "[]";

const FILTER_SCRIPT: &str = "def main():
    numbers = [num for num in range(1, 11)]
    return {\"even_numbers\": [num for num in numbers if num % 2 == 0]}

main()";

const SUM_SCRIPT: &str = "def main():
    even_numbers = []
    return {\"sum\": sum(even_numbers)}

main()";

pub fn demo_nodes() -> Vec<Node> {
    vec![
        Node::new(
            "1",
            Position::new(0.0, 0.0),
            "Generated Numbers: [1, 2, 3, 4, 5, 6, 7, 8, 9, 10]",
        ),
        Node::new(
            "2",
            Position::new(100.0, 100.0),
            "Filter Generated Numbers: Return Even Numbers",
        )
        .with_script(FILTER_SCRIPT),
        Node::new(
            "3",
            Position::new(100.0, 200.0),
            "Result: Sum of Even Numbers",
        )
        .with_script(SUM_SCRIPT),
    ]
}

pub fn demo_edges() -> Vec<Edge> {
    vec![
        Edge::custom("1", "2").with_label("reconnectable edge"),
        Edge::custom("2", "3"),
    ]
}

pub fn demo_rules() -> Vec<SubstitutionRule> {
    vec![SubstitutionRule::new(
        "2",
        "even_numbers",
        "3",
        EVEN_NUMBERS_PLACEHOLDER,
    )]
}

pub fn demo_store() -> GraphStore {
    GraphStore::new(demo_nodes(), demo_edges())
}
