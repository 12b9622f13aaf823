/// Word lists the fixtures draw from

use membres_shared::models::beneficiary::Address;
use rand::seq::SliceRandom;
use rand::Rng;

pub const FIRSTNAMES: &[&str] = &[
    "Camille", "Léa", "Hugo", "Manon", "Lucas", "Chloé", "Louis", "Inès", "Jules", "Sarah",
    "Gabriel", "Zoé", "Arthur", "Jeanne", "Nathan", "Lina", "Théo", "Alice", "Noé", "Rose",
];

pub const LASTNAMES: &[&str] = &[
    "Martin", "Bernard", "Dubois", "Thomas", "Robert", "Richard", "Petit", "Durand", "Leroy",
    "Moreau", "Simon", "Laurent", "Lefèvre", "Michel", "Garcia", "David", "Bertrand", "Roux",
];

const STREETS: &[&str] = &[
    "rue des Lilas",
    "avenue Jean Jaurès",
    "place du Marché",
    "rue de la République",
    "impasse des Tilleuls",
    "boulevard Voltaire",
];

const CITIES: &[(&str, &str)] = &[
    ("69001", "Lyon"),
    ("69100", "Villeurbanne"),
    ("69200", "Vénissieux"),
    ("69300", "Caluire-et-Cuire"),
];

pub fn pick<'a, R: Rng + ?Sized>(rng: &mut R, words: &[&'a str]) -> &'a str {
    words.choose(rng).copied().unwrap_or_default()
}

pub fn phone<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "06 {:02} {:02} {:02} {:02}",
        rng.gen_range(0..100),
        rng.gen_range(0..100),
        rng.gen_range(0..100),
        rng.gen_range(0..100)
    )
}

pub fn address<R: Rng + ?Sized>(rng: &mut R) -> Address {
    let (zipcode, city) = CITIES.choose(rng).copied().unwrap_or(("69001", "Lyon"));

    Address {
        street1: Some(format!("{} {}", rng.gen_range(1..120), pick(rng, STREETS))),
        street2: None,
        zipcode: Some(zipcode.to_string()),
        city: Some(city.to_string()),
    }
}

/// EAN-13 like number printed on swipe cards
pub fn card_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..13).map(|_| char::from(b'0' + rng.gen_range(0..10))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_card_code_is_thirteen_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        let code = card_code(&mut rng);

        assert_eq!(code.len(), 13);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_same_seed_same_draws() {
        let mut first = StdRng::seed_from_u64(42);
        let mut second = StdRng::seed_from_u64(42);

        assert_eq!(address(&mut first), address(&mut second));
        assert_eq!(phone(&mut first), phone(&mut second));
    }
}
