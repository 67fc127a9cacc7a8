use serde::{Deserialize, Serialize};
use std::fmt;

/// Display tier derived from cumulative credit points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum League {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl League {
    /// Minimum credit total required to sit in this league.
    #[must_use]
    pub fn min_points(self) -> i64 {
        match self {
            League::Bronze => 0,
            League::Silver => 300,
            League::Gold => 800,
            League::Platinum => 1500,
            League::Diamond => 2500,
        }
    }

    /// League for a cumulative credit total.
    #[must_use]
    pub fn for_credits(points: i64) -> Self {
        if points >= League::Diamond.min_points() {
            League::Diamond
        } else if points >= League::Platinum.min_points() {
            League::Platinum
        } else if points >= League::Gold.min_points() {
            League::Gold
        } else if points >= League::Silver.min_points() {
            League::Silver
        } else {
            League::Bronze
        }
    }

    /// The next tier up, if any.
    #[must_use]
    pub fn next(self) -> Option<League> {
        match self {
            League::Bronze => Some(League::Silver),
            League::Silver => Some(League::Gold),
            League::Gold => Some(League::Platinum),
            League::Platinum => Some(League::Diamond),
            League::Diamond => None,
        }
    }

    /// Points still needed to reach the next tier; `None` at the top.
    #[must_use]
    pub fn points_to_next(self, points: i64) -> Option<i64> {
        self.next().map(|next| (next.min_points() - points).max(0))
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            League::Bronze => "Bronze",
            League::Silver => "Silver",
            League::Gold => "Gold",
            League::Platinum => "Platinum",
            League::Diamond => "Diamond",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_land_in_the_higher_tier() {
        assert_eq!(League::for_credits(0), League::Bronze);
        assert_eq!(League::for_credits(299), League::Bronze);
        assert_eq!(League::for_credits(300), League::Silver);
        assert_eq!(League::for_credits(800), League::Gold);
        assert_eq!(League::for_credits(1500), League::Platinum);
        assert_eq!(League::for_credits(2500), League::Diamond);
        assert_eq!(League::for_credits(1_000_000), League::Diamond);
    }

    #[test]
    fn points_to_next_counts_down() {
        assert_eq!(League::Bronze.points_to_next(0), Some(300));
        assert_eq!(League::Bronze.points_to_next(250), Some(50));
        assert_eq!(League::Diamond.points_to_next(9000), None);
    }

    #[test]
    fn points_to_next_never_negative() {
        // A total above the threshold while still displayed in the lower
        // tier cannot underflow the remaining-points figure.
        assert_eq!(League::Bronze.points_to_next(350), Some(0));
    }
}
