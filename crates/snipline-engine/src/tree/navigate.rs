use super::{NodeId, Tree};

impl Tree {
    fn live_tabstops(&self) -> impl Iterator<Item = (u32, NodeId)> + '_ {
        self.walk()
            .into_iter()
            .filter_map(|id| self.nodes[id.0].tabstop_number().map(|n| (n, id)))
    }

    /// The live tabstop with the smallest number above `after`, anywhere in
    /// the tree.
    pub fn next_tabstop(&self, after: u32) -> Option<(u32, NodeId)> {
        self.live_tabstops().filter(|&(n, _)| n > after).min()
    }

    /// The live tabstop with the largest number below `before`. Tabstop 0
    /// is never a candidate.
    pub fn prev_tabstop(&self, before: u32) -> Option<(u32, NodeId)> {
        self.live_tabstops()
            .filter(|&(n, _)| n > 0 && n < before)
            .max()
    }

    pub fn find_tabstop(&self, number: u32) -> Option<NodeId> {
        self.live_tabstops()
            .find(|&(n, _)| n == number)
            .map(|(_, id)| id)
    }
}
