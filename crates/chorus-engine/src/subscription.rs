use std::collections::HashSet;

/// Subscription expression DSL: `Expr := Topic(t) | And(Expr, Expr) |
/// Or(Expr, Expr)` (spec §4.2). No parser is required — trees are built
/// programmatically via the fluent methods below (spec §9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Topic(String),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn topic(name: impl Into<String>) -> Self {
        Expr::Topic(name.into())
    }

    pub fn and(self, other: Expr) -> Self {
        Expr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expr) -> Self {
        Expr::Or(Box::new(self), Box::new(other))
    }

    /// `evaluate(expr, fresh)` where `fresh` is the set of topic names that
    /// currently have unread events for the node being checked (spec §4.2).
    ///
    /// OR-branches do not wait for slower branches: a node fires as soon as
    /// any branch is satisfied, regardless of whether the other branch also
    /// has fresh events. This is a deliberate latency-over-determinism
    /// choice (spec §4.2 "Design rule").
    pub fn evaluate(&self, fresh: &HashSet<&str>) -> bool {
        match self {
            Expr::Topic(name) => fresh.contains(name.as_str()),
            Expr::And(l, r) => l.evaluate(fresh) && r.evaluate(fresh),
            Expr::Or(l, r) => l.evaluate(fresh) || r.evaluate(fresh),
        }
    }

    /// `topics(expr)` — the set of distinct topic references, used to build
    /// the inverse index. Duplicate references collapse.
    pub fn topics(&self) -> HashSet<&str> {
        let mut out = HashSet::new();
        self.collect_topics(&mut out);
        out
    }

    fn collect_topics<'a>(&'a self, out: &mut HashSet<&'a str>) {
        match self {
            Expr::Topic(name) => {
                out.insert(name.as_str());
            }
            Expr::And(l, r) | Expr::Or(l, r) => {
                l.collect_topics(out);
                r.collect_topics(out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_requires_both_branches_fresh() {
        let expr = Expr::topic("A").and(Expr::topic("B"));
        assert!(!expr.evaluate(&HashSet::from(["A"])));
        assert!(!expr.evaluate(&HashSet::from(["B"])));
        assert!(expr.evaluate(&HashSet::from(["A", "B"])));
    }

    #[test]
    fn or_fires_on_either_branch() {
        let expr = Expr::topic("A").or(Expr::topic("B"));
        assert!(expr.evaluate(&HashSet::from(["A"])));
        assert!(expr.evaluate(&HashSet::from(["B"])));
        assert!(!expr.evaluate(&HashSet::new()));
    }

    #[test]
    fn topics_collapses_duplicates() {
        let expr = Expr::topic("A").or(Expr::topic("A").and(Expr::topic("B")));
        let topics = expr.topics();
        assert_eq!(topics, HashSet::from(["A", "B"]));
    }
}
