//! Swipe deck filtering
//!
//! Candidates come from the account store, optionally pre-filtered by gender.
//! Everything else (preference checks, interest overlap, distance, already
//! swiped exclusion) happens here, on the client side.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::{Account, AccountId};

/// An account shown in a swipe deck together with its distance from the requester.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckCandidate {
    pub account: Account,
    pub distance_km: f64,
}

/// Filter `candidates` into the deck shown to `requester`.
///
/// Keeps accounts that match the requester's gender preference, share at least
/// one interest (only when the requester lists interests), sit within the
/// requester's maximum distance, and are neither the requester nor already
/// swiped. Results are ordered nearest first, ties broken by id.
#[must_use]
pub fn build_deck(
    requester: &Account,
    candidates: Vec<Account>,
    swiped: &HashSet<AccountId>,
    limit: Option<usize>,
) -> Vec<DeckCandidate> {
    let origin = requester.location_or_origin();
    let max_distance = f64::from(requester.preferences.max_distance_km);
    let wanted_interests: HashSet<String> = requester
        .interests
        .iter()
        .map(|interest| interest.to_lowercase())
        .collect();

    let mut deck: Vec<DeckCandidate> = candidates
        .into_iter()
        .filter(|candidate| candidate.id != requester.id)
        .filter(|candidate| !swiped.contains(&candidate.id))
        .filter(|candidate| requester.preferences.gender.accepts(&candidate.gender))
        .filter(|candidate| shares_interest(&wanted_interests, candidate))
        .filter_map(|candidate| {
            let distance_km = origin.distance_km(&candidate.location_or_origin());
            (distance_km <= max_distance).then_some(DeckCandidate {
                account: candidate,
                distance_km,
            })
        })
        .collect();

    deck.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| a.account.id.cmp(&b.account.id))
    });

    if let Some(limit) = limit {
        deck.truncate(limit);
    }
    deck
}

fn shares_interest(wanted: &HashSet<String>, candidate: &Account) -> bool {
    wanted.is_empty()
        || candidate
            .interests
            .iter()
            .any(|interest| wanted.contains(&interest.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GenderPreference, GeoPoint};

    fn account(id: &str, gender: &str, interests: &[&str], location: GeoPoint) -> Account {
        let mut account = Account::new(AccountId::new(id).unwrap(), format!("{id} name"), None);
        account.gender = gender.to_string();
        account.interests = interests.iter().map(|i| (*i).to_string()).collect();
        account.location = Some(location);
        account
    }

    fn ids(deck: &[DeckCandidate]) -> Vec<&str> {
        deck.iter().map(|c| c.account.id.as_str()).collect()
    }

    const HOME: GeoPoint = GeoPoint::new(48.8566, 2.3522);
    const NEARBY: GeoPoint = GeoPoint::new(48.8606, 2.3376);
    const FAR: GeoPoint = GeoPoint::new(45.7640, 4.8357);

    #[test]
    fn test_excludes_requester_and_swiped() {
        let me = account("me", "Male", &[], HOME);
        let candidates = vec![
            me.clone(),
            account("a", "Female", &[], NEARBY),
            account("b", "Female", &[], NEARBY),
        ];
        let swiped = HashSet::from([AccountId::new("a").unwrap()]);

        let deck = build_deck(&me, candidates, &swiped, None);
        assert_eq!(ids(&deck), vec!["b"]);
    }

    #[test]
    fn test_applies_gender_preference() {
        let mut me = account("me", "Male", &[], HOME);
        me.preferences.gender = GenderPreference::Only("Female".to_string());
        let candidates = vec![
            account("a", "Female", &[], NEARBY),
            account("b", "Male", &[], NEARBY),
        ];

        let deck = build_deck(&me, candidates, &HashSet::new(), None);
        assert_eq!(ids(&deck), vec!["a"]);
    }

    #[test]
    fn test_requires_interest_overlap_only_when_requester_has_interests() {
        let candidates = vec![
            account("a", "X", &["running"], NEARBY),
            account("b", "X", &["chess"], NEARBY),
        ];

        let picky = account("me", "X", &["Running"], HOME);
        let deck = build_deck(&picky, candidates.clone(), &HashSet::new(), None);
        assert_eq!(ids(&deck), vec!["a"]);

        let open = account("me", "X", &[], HOME);
        let deck = build_deck(&open, candidates, &HashSet::new(), None);
        assert_eq!(deck.len(), 2);
    }

    #[test]
    fn test_drops_candidates_beyond_max_distance() {
        let mut me = account("me", "X", &[], HOME);
        me.preferences.max_distance_km = 50;
        let candidates = vec![account("far", "X", &[], FAR), account("near", "X", &[], NEARBY)];

        let deck = build_deck(&me, candidates, &HashSet::new(), None);
        assert_eq!(ids(&deck), vec!["near"]);
        assert!(deck[0].distance_km < 2.0);
    }

    #[test]
    fn test_missing_location_counts_as_origin() {
        let mut me = account("me", "X", &[], GeoPoint::default());
        me.location = None;
        let mut nowhere = account("nowhere", "X", &[], GeoPoint::default());
        nowhere.location = None;

        let deck = build_deck(&me, vec![nowhere, account("paris", "X", &[], HOME)], &HashSet::new(), None);
        assert_eq!(ids(&deck), vec!["nowhere"]);
    }

    #[test]
    fn test_orders_nearest_first_and_truncates() {
        let mut me = account("me", "X", &[], HOME);
        me.preferences.max_distance_km = 1000;
        let candidates = vec![
            account("far", "X", &[], FAR),
            account("b", "X", &[], NEARBY),
            account("a", "X", &[], NEARBY),
        ];

        let deck = build_deck(&me, candidates, &HashSet::new(), Some(2));
        assert_eq!(ids(&deck), vec!["a", "b"]);
    }
}
