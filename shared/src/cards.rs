//! Static card data for Sherlock-13.
//!
//! The game uses a fixed deck of 13 suspect cards. Each card carries a small
//! set of object tags (pipe, lightbulb, fist, ...). At deal time the server
//! sums the tags of a player's three cards to produce that player's object
//! counts, which is all the deduction in the game is based on.

/// Number of cards in the deck.
pub const CARD_COUNT: usize = 13;

/// Number of distinct object kinds a card can carry.
pub const OBJECT_COUNT: usize = 8;

/// A game always has exactly four seated players.
pub const MAX_PLAYERS: usize = 4;

/// Cards dealt to each player. The 13th card is never dealt: it is the culprit.
pub const CARDS_PER_PLAYER: usize = 3;

/// Display names for the 13 suspect cards, indexed by card id.
pub const CARD_NAMES: [&str; CARD_COUNT] = [
    "Sebastian Moran",
    "Irene Adler",
    "Inspector Lestrade",
    "Inspector Gregson",
    "Inspector Baynes",
    "Inspector Bradstreet",
    "Inspector Hopkins",
    "Sherlock Holmes",
    "John Watson",
    "Mycroft Holmes",
    "Mrs. Hudson",
    "Mary Morstan",
    "James Moriarty",
];

/// Display names for the 8 object kinds, indexed by object id.
pub const OBJECT_NAMES: [&str; OBJECT_COUNT] = [
    "Pipe", "Lightbulb", "Fist", "Badge", "Notebook", "Necklace", "Eye", "Skull",
];

/// Object tags per card: `OBJECT_TAGS[card][object]` is how many of that
/// object the card carries. Rows follow the card ids in [`CARD_NAMES`],
/// columns follow [`OBJECT_NAMES`].
pub const OBJECT_TAGS: [[i32; OBJECT_COUNT]; CARD_COUNT] = [
    // Pipe, Lightbulb, Fist, Badge, Notebook, Necklace, Eye, Skull
    [0, 0, 1, 0, 0, 0, 0, 1], // Sebastian Moran
    [0, 1, 0, 0, 0, 1, 0, 1], // Irene Adler
    [0, 0, 0, 1, 1, 0, 1, 0], // Inspector Lestrade
    [0, 0, 1, 1, 1, 0, 0, 0], // Inspector Gregson
    [0, 1, 0, 1, 0, 0, 0, 0], // Inspector Baynes
    [0, 0, 1, 1, 0, 0, 0, 0], // Inspector Bradstreet
    [1, 0, 0, 1, 0, 0, 1, 0], // Inspector Hopkins
    [1, 1, 1, 0, 0, 0, 0, 0], // Sherlock Holmes
    [1, 0, 1, 0, 0, 0, 1, 0], // John Watson
    [1, 1, 0, 0, 1, 0, 0, 0], // Mycroft Holmes
    [1, 0, 0, 0, 0, 1, 0, 0], // Mrs. Hudson
    [0, 0, 0, 0, 1, 1, 0, 0], // Mary Morstan
    [0, 1, 0, 0, 0, 0, 0, 1], // James Moriarty
];

/// Sums the object tags of a hand of cards.
///
/// This is how the server derives a player's object counts from the three
/// cards it was dealt. Card ids outside the deck are ignored.
pub fn object_counts(cards: &[i32]) -> [i32; OBJECT_COUNT] {
    let mut counts = [0i32; OBJECT_COUNT];
    for &card in cards {
        if (0..CARD_COUNT as i32).contains(&card) {
            for (object, count) in counts.iter_mut().enumerate() {
                *count += OBJECT_TAGS[card as usize][object];
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_card_carries_two_or_three_tags() {
        for (card, tags) in OBJECT_TAGS.iter().enumerate() {
            let total: i32 = tags.iter().sum();
            assert!(
                (2..=3).contains(&total),
                "card {} ({}) carries {} tags",
                card,
                CARD_NAMES[card],
                total
            );
        }
    }

    #[test]
    fn test_object_totals_across_deck() {
        // Fixed totals over the whole deck, per object kind.
        let mut totals = [0i32; OBJECT_COUNT];
        for tags in OBJECT_TAGS.iter() {
            for (object, tag) in tags.iter().enumerate() {
                totals[object] += tag;
            }
        }
        // Pipe, Lightbulb, Fist, Badge, Notebook, Necklace, Eye, Skull
        assert_eq!(totals, [5, 5, 5, 5, 4, 3, 3, 3]);
    }

    #[test]
    fn test_object_counts_sums_hand() {
        // Sherlock Holmes + John Watson + Mrs. Hudson
        let counts = object_counts(&[7, 8, 10]);
        assert_eq!(counts[0], 3); // all three carry a pipe
        assert_eq!(counts[1], 1);
        assert_eq!(counts[2], 2);
        assert_eq!(counts[5], 1);
        assert_eq!(counts[6], 1);
        assert_eq!(counts[7], 0);
    }

    #[test]
    fn test_object_counts_ignores_out_of_range_cards() {
        assert_eq!(object_counts(&[-1, 13, 99]), [0; OBJECT_COUNT]);
    }

    #[test]
    fn test_name_tables_match_sizes() {
        assert_eq!(CARD_NAMES.len(), CARD_COUNT);
        assert_eq!(OBJECT_NAMES.len(), OBJECT_COUNT);
    }
}
