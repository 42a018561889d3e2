/// A request kind whose newest result is the only one worth applying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestSlot {
    Ask,
    FileList,
    News,
}

/// Ties a backend response to the request that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken {
    slot: RequestSlot,
    generation: u64,
}

impl RequestToken {
    pub fn new(slot: RequestSlot, generation: u64) -> Self {
        Self { slot, generation }
    }

    pub fn slot(&self) -> RequestSlot {
        self.slot
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Per-slot generation counters.
///
/// Issuing a token for a slot makes every earlier token of that slot stale;
/// `advance_all` does the same for every slot at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generations {
    ask: u64,
    file_list: u64,
    news: u64,
}

impl Generations {
    pub fn issue(&mut self, slot: RequestSlot) -> RequestToken {
        let counter = self.counter_mut(slot);
        *counter += 1;
        RequestToken::new(slot, *counter)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.current(token.slot) == token.generation
    }

    pub fn advance_all(&mut self) {
        self.ask += 1;
        self.file_list += 1;
        self.news += 1;
    }

    fn current(&self, slot: RequestSlot) -> u64 {
        match slot {
            RequestSlot::Ask => self.ask,
            RequestSlot::FileList => self.file_list,
            RequestSlot::News => self.news,
        }
    }

    fn counter_mut(&mut self, slot: RequestSlot) -> &mut u64 {
        match slot {
            RequestSlot::Ask => &mut self.ask,
            RequestSlot::FileList => &mut self.file_list,
            RequestSlot::News => &mut self.news,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_token_supersedes_older_one_in_same_slot() {
        let mut generations = Generations::default();
        let first = generations.issue(RequestSlot::FileList);
        let second = generations.issue(RequestSlot::FileList);

        assert!(!generations.is_current(first));
        assert!(generations.is_current(second));
    }

    #[test]
    fn slots_are_independent_until_advance_all() {
        let mut generations = Generations::default();
        let ask = generations.issue(RequestSlot::Ask);
        let news = generations.issue(RequestSlot::News);
        let _ = generations.issue(RequestSlot::FileList);
        assert!(generations.is_current(ask));
        assert!(generations.is_current(news));

        generations.advance_all();
        assert!(!generations.is_current(ask));
        assert!(!generations.is_current(news));
    }
}
