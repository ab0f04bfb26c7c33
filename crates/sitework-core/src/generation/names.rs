//! Random worker and crew names.

use crate::components::Name;
use rand::Rng;

fn pick(rng: &mut impl Rng, list: &[&'static str]) -> &'static str {
    list[rng.gen_range(0..list.len())]
}

pub fn generate_name(rng: &mut impl Rng) -> Name {
    Name::new(pick(rng, GIVEN_NAMES), pick(rng, FAMILY_NAMES))
}

/// Generate a crew name such as "Granite Gang".
pub fn generate_crew_name(rng: &mut impl Rng) -> String {
    let first = pick(rng, CREW_ADJECTIVES);
    format!("{} {}", first, pick(rng, CREW_NOUNS))
}

static GIVEN_NAMES: &[&str] = &[
    "Adam", "Agnes", "Alan", "Anna", "Arthur", "Beatrice", "Ben", "Carla",
    "Colin", "Dana", "Derek", "Edith", "Emil", "Frank", "Greta", "Hank",
    "Ines", "Ivan", "Jack", "Joanna", "Karl", "Lena", "Luis", "Maggie",
    "Marek", "Nina", "Oscar", "Paula", "Rafael", "Rosa", "Sam", "Tomas",
    "Ursula", "Viktor", "Wanda", "Yusuf", "Zofia", "Bruno", "Chidi", "Hana",
];

static FAMILY_NAMES: &[&str] = &[
    "Archer", "Baker", "Carter", "Dunn", "Fischer", "Foster", "Gray", "Hale",
    "Hughes", "Kowal", "Lopez", "Mason", "Meyer", "Novak", "Okafor", "Price",
    "Reed", "Ruiz", "Schmidt", "Shaw", "Silva", "Stone", "Tanaka", "Turner",
    "Walsh", "Wright", "Young", "Zielinski", "Brennan", "Costa",
];

static CREW_ADJECTIVES: &[&str] = &[
    "Granite", "Iron", "Red", "Steady", "Northside", "Riverside", "Early",
    "Copper", "Oak", "Level",
];

static CREW_NOUNS: &[&str] = &[
    "Gang", "Crew", "Builders", "Hands", "Team", "Works", "Squad",
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_names_come_from_lists() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let name = generate_name(&mut rng);
            assert!(GIVEN_NAMES.contains(&name.given.as_str()));
            assert!(FAMILY_NAMES.contains(&name.family.as_str()));
        }
    }

    #[test]
    fn test_same_seed_same_names() {
        let a: Vec<String> = {
            let mut rng = StdRng::seed_from_u64(2);
            (0..20).map(|_| generate_name(&mut rng).full_name()).collect()
        };
        let b: Vec<String> = {
            let mut rng = StdRng::seed_from_u64(2);
            (0..20).map(|_| generate_name(&mut rng).full_name()).collect()
        };
        assert_eq!(a, b);
        let distinct: std::collections::BTreeSet<_> = a.iter().collect();
        assert!(distinct.len() > 5);
    }

    #[test]
    fn test_crew_name_has_two_words() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(generate_crew_name(&mut rng).split(' ').count(), 2);
    }
}
