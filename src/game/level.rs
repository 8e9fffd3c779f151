//! Experience and level progression

use crate::db::Monkey;

pub const EXPERIENCE_PER_LEVEL: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub experience: i64,
    pub level: i64,
    pub levels_gained: i64,
}

/// Add experience, rolling every full 100 into a level
pub fn gain_experience(experience: i64, level: i64, delta: i64) -> Progress {
    let mut experience = experience + delta.max(0);
    let mut level = level;
    let mut levels_gained = 0;
    while experience >= EXPERIENCE_PER_LEVEL {
        experience -= EXPERIENCE_PER_LEVEL;
        level += 1;
        levels_gained += 1;
    }
    Progress { experience, level, levels_gained }
}

impl Monkey {
    /// Returns the number of levels gained
    pub fn gain_experience(&mut self, delta: i64) -> i64 {
        let progress = gain_experience(self.experience, self.level, delta);
        self.experience = progress.experience;
        self.level = progress.level;
        progress.levels_gained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascading_level_ups() {
        let p = gain_experience(80, 3, 250);
        assert_eq!(p, Progress { experience: 30, level: 6, levels_gained: 3 });
    }

    #[test]
    fn test_no_level_up_below_threshold() {
        let p = gain_experience(50, 1, 49);
        assert_eq!(p, Progress { experience: 99, level: 1, levels_gained: 0 });
    }

    #[test]
    fn test_exact_threshold() {
        let p = gain_experience(75, 1, 25);
        assert_eq!(p, Progress { experience: 0, level: 2, levels_gained: 1 });
    }

    #[test]
    fn test_zero_delta() {
        let p = gain_experience(10, 4, 0);
        assert_eq!(p, Progress { experience: 10, level: 4, levels_gained: 0 });
    }

    #[test]
    fn test_monkey_gain_experience() {
        let mut m = Monkey::new(1, chrono::Utc::now());
        assert_eq!(m.gain_experience(125), 1);
        assert_eq!(m.level, 2);
        assert_eq!(m.experience, 25);
    }
}
