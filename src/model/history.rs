use serde::{Deserialize, Serialize};

use crate::model::round::RoundRecord;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("round {got} appended out of sequence, expected round {expected}")]
    OutOfSequence { expected: u32, got: u32 },
}

/// Append-only sequence of committed rounds, ordered by round number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    rounds: Vec<RoundRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: RoundRecord) -> Result<(), HistoryError> {
        let expected = self.rounds.len() as u32 + 1;
        if record.round_number != expected {
            return Err(HistoryError::OutOfSequence {
                expected,
                got: record.round_number,
            });
        }

        self.rounds.push(record);
        Ok(())
    }

    pub fn all(&self) -> &[RoundRecord] {
        &self.rounds
    }

    pub fn last(&self) -> Option<&RoundRecord> {
        self.rounds.last()
    }

    pub fn first(&self) -> Option<&RoundRecord> {
        self.rounds.first()
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Only called on session reset.
    pub fn clear(&mut self) {
        self.rounds.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::round::ProgressionDirective;

    fn record(round_number: u32) -> RoundRecord {
        RoundRecord {
            round_number,
            scene: format!("scene {round_number}"),
            distortion_type: "灾难化".into(),
            inner_thought: "完了".into(),
            guidance_suggestions: vec!["慢下来".into()],
            memory_summary: "summary".into(),
            user_comfort: "没关系".into(),
            progression_directive: ProgressionDirective::default(),
        }
    }

    #[test]
    fn appends_in_sequence() {
        let mut history = History::new();
        assert!(history.last().is_none());

        history.append(record(1)).unwrap();
        history.append(record(2)).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.last().unwrap().round_number, 2);
        let numbers: Vec<u32> = history.all().iter().map(|r| r.round_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn rejects_gaps_and_repeats() {
        let mut history = History::new();
        assert_eq!(
            history.append(record(2)),
            Err(HistoryError::OutOfSequence { expected: 1, got: 2 })
        );

        history.append(record(1)).unwrap();
        assert_eq!(
            history.append(record(1)),
            Err(HistoryError::OutOfSequence { expected: 2, got: 1 })
        );
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn clear_empties() {
        let mut history = History::new();
        history.append(record(1)).unwrap();
        history.clear();
        assert!(history.is_empty());
        history.append(record(1)).unwrap();
    }
}
