pub struct IdleEvaluator {
    threshold_ms: u32,
}

impl IdleEvaluator {
    pub fn from_seconds(threshold_s: u32) -> Self {
        Self {
            threshold_ms: threshold_s * 1000,
        }
    }

    pub fn is_idle(&self, idle_time: u32) -> bool {
        self.threshold_ms < idle_time
    }
}

#[cfg(test)]
mod tests {
    use super::IdleEvaluator;

    #[test]
    fn threshold_is_exclusive() {
        let evaluator = IdleEvaluator::from_seconds(300);
        assert!(!evaluator.is_idle(300_000));
        assert!(evaluator.is_idle(300_001));
        assert!(!evaluator.is_idle(0));
    }
}
