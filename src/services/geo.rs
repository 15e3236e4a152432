//! Keyword heuristic deciding whether a trip crosses borders.
//!
//! Misclassifications are known and accepted: a domestic trip with more than
//! three stops counts as international, and keywords are plain substrings.
//! Checklist content depends on this exact behaviour.

const ASIA: &[&str] = &[
    "japan", "tokyo", "osaka", "kyoto", "china", "beijing", "shanghai", "hong kong", "korea",
    "seoul", "thailand", "bangkok", "phuket", "singapore", "malaysia", "kuala lumpur",
    "indonesia", "bali", "jakarta", "vietnam", "hanoi", "ho chi minh", "philippines", "manila",
    "india", "delhi", "mumbai", "taiwan", "taipei",
];

const NORTH_AMERICA: &[&str] = &[
    "united states", "usa", "new york", "los angeles", "san francisco", "chicago", "miami",
    "las vegas", "seattle", "boston", "washington", "canada", "toronto", "vancouver", "montreal",
    "mexico", "cancun",
];

const EUROPE: &[&str] = &[
    "france", "paris", "germany", "berlin", "munich", "italy", "rome", "milan", "venice",
    "spain", "madrid", "barcelona", "united kingdom", "england", "london", "scotland",
    "netherlands", "amsterdam", "switzerland", "zurich", "portugal", "lisbon", "greece",
    "athens", "austria", "vienna", "prague",
];

const OCEANIA: &[&str] = &[
    "australia", "sydney", "melbourne", "brisbane", "perth", "new zealand", "auckland",
    "wellington", "queenstown", "fiji",
];

const REGIONS: [&[&str]; 4] = [ASIA, NORTH_AMERICA, EUROPE, OCEANIA];

const MAX_DOMESTIC_STOPS: usize = 3;

pub fn is_international<S: AsRef<str>>(locations: &[S]) -> bool {
    let lowered: Vec<String> = locations
        .iter()
        .map(|location| location.as_ref().trim())
        .filter(|location| !location.is_empty())
        .map(str::to_lowercase)
        .collect();

    let regions_hit = REGIONS
        .iter()
        .filter(|keywords| {
            lowered
                .iter()
                .any(|location| keywords.iter().any(|keyword| location.contains(keyword)))
        })
        .count();

    regions_hit > 1 || lowered.len() > MAX_DOMESTIC_STOPS
}

#[cfg(test)]
mod tests {
    use super::is_international;

    #[test]
    fn two_regions_are_international() {
        assert!(is_international(&["Paris", "Tokyo"]));
        assert!(is_international(&["Sydney, Australia", "Los Angeles, CA"]));
    }

    #[test]
    fn single_city_is_domestic() {
        assert!(!is_international(&["New York"]));
        assert!(!is_international(&["Berlin", "Munich"]));
    }

    #[test]
    fn more_than_three_stops_counts_as_international() {
        assert!(is_international(&["A", "B", "C", "D"]));
        assert!(!is_international(&["A", "B", "C"]));
    }

    #[test]
    fn blank_locations_are_ignored() {
        assert!(!is_international(&["A", "", "  ", "B", "C"]));
    }
}
