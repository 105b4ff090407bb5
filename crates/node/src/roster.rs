//! Demo fighters and their move sets.
use arena_runtime::CompetitorRegistry;
use fight_core::{CompetitorId, Move};
use ledger_core::InMemoryLedger;

pub struct Entrant {
    pub name: String,
    pub id: CompetitorId,
    pub moves: Vec<Move>,
}

struct BuiltIn {
    name: &'static str,
    id: &'static str,
    moves: &'static [(&'static str, u32, u32)],
}

const BUILT_IN: [BuiltIn; 4] = [
    BuiltIn {
        name: "Iron Claw",
        id: "0x1c1a",
        moves: &[("Claw Swipe", 6, 12), ("Crushing Grip", 10, 16), ("Feint", 2, 6)],
    },
    BuiltIn {
        name: "Viper",
        id: "0x5e1f",
        moves: &[("Fang Strike", 8, 14), ("Coil", 3, 7), ("Venom Lash", 5, 18)],
    },
    BuiltIn {
        name: "Granite",
        id: "0x6a17",
        moves: &[("Boulder Fist", 12, 18), ("Shoulder Check", 4, 10)],
    },
    BuiltIn {
        name: "Zephyr",
        id: "0x2e9b",
        moves: &[("Gale Kick", 5, 11), ("Flurry", 7, 13), ("Updraft", 1, 20)],
    },
];

/// Fallback kit for roster names without a built-in profile.
const BRAWLER: &[(&str, u32, u32)] = &[("Jab", 5, 10), ("Hook", 8, 14), ("Uppercut", 10, 16)];

pub fn default_names() -> Vec<String> {
    BUILT_IN.iter().map(|f| f.name.to_owned()).collect()
}

/// Resolve roster names to entrants. Unknown names get the brawler kit and a
/// generated id.
pub fn entrants(names: &[String]) -> Vec<Entrant> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let built_in = BUILT_IN
                .iter()
                .find(|f| f.name.eq_ignore_ascii_case(name.trim()));
            match built_in {
                Some(fighter) => Entrant {
                    name: fighter.name.to_owned(),
                    id: CompetitorId::new(fighter.id),
                    moves: kit(fighter.moves),
                },
                None => Entrant {
                    name: name.trim().to_owned(),
                    id: CompetitorId::new(format!("0xf{index:03x}")),
                    moves: kit(BRAWLER),
                },
            }
        })
        .collect()
}

fn kit(moves: &[(&str, u32, u32)]) -> Vec<Move> {
    moves
        .iter()
        .map(|&(name, min, max)| Move::new(name, min, max))
        .collect()
}

pub fn registry(entrants: &[Entrant]) -> CompetitorRegistry {
    entrants
        .iter()
        .fold(CompetitorRegistry::new(), |registry, entrant| {
            registry.with(entrant.name.clone(), entrant.id.clone())
        })
}

/// In-memory ledger that knows every entrant's moves and seeds each pool
/// with `opening_stake` on both sides.
pub fn ledger(entrants: &[Entrant], opening_stake: u64) -> InMemoryLedger {
    entrants
        .iter()
        .fold(InMemoryLedger::new(), |ledger, entrant| {
            ledger.with_move_set(entrant.id.clone(), entrant.moves.clone())
        })
        .with_opening_stake(opening_stake, opening_stake)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_moves_are_valid() {
        for fighter in entrants(&default_names()) {
            assert!(!fighter.moves.is_empty());
            assert!(fighter.moves.iter().all(|m| m.min_damage <= m.max_damage));
        }
    }

    #[test]
    fn unknown_names_get_distinct_ids() {
        let names = vec!["viper".to_string(), "Rookie".into(), "Novice".into()];
        let resolved = entrants(&names);
        assert_eq!(resolved[0].name, "Viper");
        assert_eq!(resolved[0].id, CompetitorId::new("0x5e1f"));
        assert_ne!(resolved[1].id, resolved[2].id);
        assert_eq!(registry(&resolved).len(), 3);
    }
}
