use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Donations,
}

/// Donation milestone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub threshold: u32,
    pub category: AchievementCategory,
}

/// Milestones, ordered by threshold
pub static ACHIEVEMENTS: [Achievement; 3] = [
    Achievement {
        id: "first-drop",
        name: "First Drop",
        description: "Complete your first blood donation",
        threshold: 1,
        category: AchievementCategory::Donations,
    },
    Achievement {
        id: "life-saver",
        name: "Life Saver",
        description: "Complete 5 blood donations",
        threshold: 5,
        category: AchievementCategory::Donations,
    },
    Achievement {
        id: "hero",
        name: "Hero",
        description: "Complete 10 blood donations",
        threshold: 10,
        category: AchievementCategory::Donations,
    },
];

pub fn earned_achievements(total_donations: u32) -> Vec<&'static Achievement> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| total_donations >= a.threshold)
        .collect()
}

pub fn next_achievement(total_donations: u32) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| total_donations < a.threshold)
}
