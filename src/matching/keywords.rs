// src/matching/keywords.rs - Ordered keyword-phrase table and canonical-name dictionary
//
// The phrase table is a hand-ordered rule list scanned top to bottom with an
// early exit. Ordering is the core correctness property: more specific phrases
// MUST come before the more general phrases they contain, or a distinct
// institution gets absorbed into a larger one's identity ("banner md anderson"
// before "md anderson"). Keep it a sequence, never a map.
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Ordered (phrase, keyword) pairs. First substring match wins.
pub const KEY_IDENTIFIERS: &[(&str, &str)] = &[
    // Major cancer centers
    // Banner MD Anderson (Gilbert, AZ) - must precede 'md anderson'
    ("banner md anderson", "banner"),
    ("banner health", "banner"),
    // MD Anderson (Houston, TX)
    ("md anderson", "mdanderson"),
    ("m.d. anderson", "mdanderson"),
    // Memorial Sloan Kettering (NYC)
    ("memorial sloan kettering", "msk"),
    ("memorial sloan-kettering", "msk"),
    ("sloan kettering", "msk"),
    ("sloan-kettering", "msk"),
    // Dana-Farber (Boston)
    ("dana farber", "danafarber"),
    ("dana-farber", "danafarber"),
    // Mayo Clinic (all locations - Phoenix, Jacksonville, Rochester)
    ("mayo clinic", "mayo"),
    // Johns Hopkins / Sidney Kimmel (Baltimore)
    ("sidney kimmel", "hopkins"),
    ("johns hopkins", "hopkins"),
    ("john hopkins", "hopkins"),
    // Cedars-Sinai (Los Angeles), including a recurring misspelling
    ("cedars-sinai", "cedarssinai"),
    ("cedars sinai", "cedarssinai"),
    ("cedars-sanai", "cedarssinai"),
    // Moffitt (Tampa)
    ("moffitt", "moffitt"),
    // City of Hope (Duarte, CA)
    ("city of hope", "cityofhope"),
    // Cleveland Clinic
    ("cleveland clinic", "clevelandclinic"),
    // Huntsman (Salt Lake City)
    ("huntsman", "huntsman"),
    // Fred Hutchinson (Seattle)
    ("fred hutchinson", "fredhutch"),
    // Roswell Park (Buffalo)
    ("roswell park", "roswellpark"),
    // Research networks
    // Sarah Cannon Research Institute / SCRI (Nashville + affiliates)
    ("sarah cannon", "sarahcannon"),
    ("scri oncology", "sarahcannon"),
    ("scri-", "sarahcannon"),
    ("scri ", "sarahcannon"),
    // START = South Texas Accelerated Research Therapeutics (all locations)
    ("south texas accelerated", "start"),
    ("start san antonio", "start"),
    ("start midwest", "start"),
    ("start dublin", "start"),
    ("start mountain", "start"),
    // NEXT Oncology (all locations)
    ("next oncology", "nextoncology"),
    ("next virginia", "nextoncology"),
    // Catches "NEXT Dallas" and friends
    ("next ", "nextoncology"),
    // US Oncology Research Network
    ("us oncology research", "usoncology"),
    ("tennessee oncology", "tennesseeoncology"),
    ("texas oncology", "texasoncology"),
    ("florida cancer specialist", "floridacancer"),
    ("florida cancer", "floridacancer"),
    ("highlands oncology", "highlands"),
    ("nebraska cancer specialist", "nebraskacancer"),
    ("virginia cancer specialist", "virginiacancer"),
    // Academic medical centers
    // Yale / Smilow (New Haven)
    ("smilow", "yale"),
    ("yale new haven", "yale"),
    ("yale cancer", "yale"),
    ("nyu langone", "nyulangone"),
    ("new york university", "nyulangone"),
    ("columbia university", "columbia"),
    ("weill cornell", "weillcornell"),
    ("new york presbyterian", "nypresbyterian"),
    // Emory / Winship (Atlanta)
    ("emory winship", "emory"),
    ("winship cancer", "emory"),
    ("emory university", "emory"),
    ("georgetown university", "georgetown"),
    ("washington university", "washu"),
    // Siteman and Barnes-Jewish are Wash U affiliates but kept distinct
    ("siteman cancer", "siteman"),
    ("barnes-jewish", "barnesjewish"),
    ("university of rochester", "urochester"),
    ("wilmot cancer", "urochester"),
    ("university of kansas", "ukansas"),
    ("university of wisconsin", "uwisconsin"),
    ("university of iowa", "uiowa"),
    ("university of michigan", "umichigan"),
    // University of Pittsburgh / Hillman
    ("hillman cancer", "upitt"),
    ("university of pittsburgh", "upitt"),
    ("university of colorado", "ucolorado"),
    ("university of cincinnati", "ucincinnati"),
    ("university of miami", "umiami"),
    ("oregon health", "ohsu"),
    ("stanford", "stanford"),
    ("vanderbilt", "vanderbilt"),
    ("duke", "duke"),
    ("massachusetts general", "mgh"),
    ("mass general", "mgh"),
    ("beth israel", "bidmc"),
    ("brigham", "brigham"),
    ("hospital of the university of pennsylvania", "upenn"),
    ("university of pennsylvania", "upenn"),
    ("jefferson university", "jefferson"),
    ("university of florida", "uflorida"),
    ("university of southern california", "usc"),
    ("university of texas southwestern", "utsw"),
    ("ut southwestern", "utsw"),
    // UC system
    ("uc san diego", "ucsd"),
    ("university of california san diego", "ucsd"),
    ("moores cancer center", "ucsd"),
    ("uc irvine", "ucirvine"),
    ("chao family", "ucirvine"),
    ("university of california, irvine", "ucirvine"),
    ("university of california irvine", "ucirvine"),
    ("ucla", "ucla"),
    ("university of california, los angeles", "ucla"),
    ("university of california los angeles", "ucla"),
    ("uc davis", "ucdavis"),
    ("university of california, davis", "ucdavis"),
    ("ucsf", "ucsf"),
    ("university of california, san francisco", "ucsf"),
    ("university of california san francisco", "ucsf"),
    ("university of california at san francisco", "ucsf"),
    // Baylor system - the two arms stay separate
    ("baylor scott", "baylorscott"),
    ("baylor college of medicine", "bcm"),
    // Other US institutions
    ("atlantic health", "atlantichealth"),
    ("northwell health", "northwell"),
    ("ochsner health", "ochsner"),
    ("medical college of wisconsin", "mcw"),
    ("hoag memorial", "hoag"),
    ("christ hospital", "christhospital"),
    ("stephenson cancer", "stephenson"),
    ("icahn school", "mountsinai"),
    ("mount sinai", "mountsinai"),
    ("hackensack", "hackensack"),
    ("lehigh valley", "lehighvalley"),
    ("mary crowley", "marycrowley"),
    ("swedish", "swedish"),
    ("virginia mason", "virginiamason"),
    ("case western", "casewestern"),
    ("honorhealth", "honorhealth"),
    ("ironwood cancer", "ironwood"),
    ("community health network", "communityhealth"),
    ("miriam hospital", "miriam"),
    ("rhode island hospital", "rihospital"),
    ("west chester hospital", "westchester"),
    // Canada
    ("princess margaret", "princessmargaret"),
    ("ottawa hospital", "ottawahospital"),
    // Australia
    ("peter maccallum", "petermac"),
    ("chris obrien lifehouse", "lifehouse"),
    ("alfred hospital", "alfred"),
    ("kinghorn cancer", "kinghorn"),
    ("st vincent", "stvincent"),
    ("monash", "monash"),
    // Europe
    ("gustave roussy", "gustaveroussy"),
    ("centre leon berard", "leonberard"),
    ("claudius regaud", "claudiusregaud"),
    ("oncopole", "claudiusregaud"),
    ("charite", "charite"),
    ("vall d hebron", "vallhebron"),
    ("vall d'hebron", "vallhebron"),
    ("hospital universitario 12 de octubre", "12octubre"),
    ("fundacion jimenez diaz", "jimenezdiaz"),
    // Japan
    ("national cancer center hospital east", "nccheast"),
    ("national cancer center hospital", "ncch"),
    ("cancer institute hospital", "jfcr"),
    ("aichi cancer center", "aichi"),
    ("kanagawa cancer", "kanagawa"),
    ("shizuoka cancer", "shizuoka"),
    ("shikoku cancer", "shikoku"),
    ("osaka international", "osakainternational"),
    ("kansai medical", "kansai"),
    ("kindai university", "kindai"),
    ("hokkaido university", "hokkaido"),
    ("tohoku university", "tohoku"),
    ("yamaguchi university", "yamaguchi"),
    // China
    ("fudan university", "fudan"),
    ("beijing cancer", "beijingcancer"),
    ("harbin medical", "harbin"),
    ("chinese academy of medical sciences", "cams"),
    ("shanghai zhongshan", "shanghaizhongshan"),
    ("zhongshan hospital", "shanghaizhongshan"),
    ("shanghai chest", "shanghaichest"),
    ("shanghai pudong", "shanghaipudong"),
    ("shanghai east", "shanghaieast"),
    ("yunnan cancer", "yunnancancer"),
    ("jiangxi cancer", "jiangxicancer"),
    ("guangdong pharmaceutical", "guangdongpharma"),
    ("chinese pla general", "plageneralhospital"),
    // Korea - must precede Singapore to avoid "national university" conflicts
    ("seoul national university", "snuh"),
    ("asan medical center", "asan"),
    ("severance hospital", "severance"),
    // Singapore
    ("national cancer centre singapore", "nccs"),
    ("national university hospital", "nuh"),
    ("tan tock seng", "ttsh"),
    // Taiwan
    ("national taiwan university", "ntuh"),
    ("national cheng kung", "ncku"),
    ("taipei veterans", "taipeivet"),
    // Hong Kong
    ("queen mary hospital", "queenmary"),
    ("prince of wales", "princeofwales"),
    // New Zealand
    ("auckland city hospital", "auckland"),
];

/// Short network names that would false-positive as substrings elsewhere
/// ("start" inside "Upstart", "next" inside "Connext"). Matched only against
/// the whole lower-cased, trimmed name.
pub const EXACT_MATCHES: &[(&str, &str)] = &[
    ("start", "start"),
    ("next", "nextoncology"),
    ("scri", "sarahcannon"),
];

/// Curated display name per keyword. A keyword missing here falls back to the
/// row's own normalized name (self-canonicalization).
pub const PREFERRED_CANONICAL: &[(&str, &str)] = &[
    ("mayo", "Mayo Clinic"),
    ("mdanderson", "MD Anderson Cancer Center"),
    ("msk", "Memorial Sloan Kettering Cancer Center"),
    ("danafarber", "Dana-Farber Cancer Institute"),
    ("hopkins", "Johns Hopkins Sidney Kimmel Cancer Center"),
    ("cedarssinai", "Cedars-Sinai Medical Center"),
    ("moffitt", "Moffitt Cancer Center"),
    ("cityofhope", "City of Hope"),
    ("clevelandclinic", "Cleveland Clinic"),
    ("huntsman", "Huntsman Cancer Institute"),
    ("fredhutch", "Fred Hutchinson Cancer Center"),
    ("roswellpark", "Roswell Park Comprehensive Cancer Center"),
    ("banner", "Banner MD Anderson Cancer Center"),
    // Research networks
    ("sarahcannon", "Sarah Cannon Research Institute"),
    ("start", "START (South Texas Accelerated Research Therapeutics)"),
    ("nextoncology", "NEXT Oncology"),
    ("usoncology", "US Oncology Research"),
    ("tennesseeoncology", "Tennessee Oncology"),
    ("texasoncology", "Texas Oncology"),
    ("floridacancer", "Florida Cancer Specialists"),
    ("highlands", "Highlands Oncology Group"),
    ("nebraskacancer", "Nebraska Cancer Specialists"),
    ("virginiacancer", "Virginia Cancer Specialists"),
    // Academic medical centers
    ("yale", "Yale Cancer Center"),
    ("nyulangone", "NYU Langone Health"),
    ("columbia", "Columbia University Irving Medical Center"),
    ("weillcornell", "Weill Cornell Medicine"),
    ("nypresbyterian", "NewYork-Presbyterian Hospital"),
    ("emory", "Emory Winship Cancer Institute"),
    ("georgetown", "Georgetown Lombardi Comprehensive Cancer Center"),
    ("washu", "Washington University in St. Louis"),
    ("siteman", "Siteman Cancer Center"),
    ("barnesjewish", "Barnes-Jewish Hospital"),
    ("urochester", "University of Rochester Wilmot Cancer Institute"),
    ("ukansas", "University of Kansas Cancer Center"),
    ("uwisconsin", "University of Wisconsin Carbone Cancer Center"),
    ("uiowa", "University of Iowa Holden Comprehensive Cancer Center"),
    ("umichigan", "University of Michigan Rogel Cancer Center"),
    ("upitt", "UPMC Hillman Cancer Center"),
    ("ucolorado", "University of Colorado Cancer Center"),
    ("ucincinnati", "University of Cincinnati Cancer Center"),
    ("umiami", "Sylvester Comprehensive Cancer Center"),
    ("ohsu", "OHSU Knight Cancer Institute"),
    ("stanford", "Stanford Cancer Institute"),
    ("vanderbilt", "Vanderbilt-Ingram Cancer Center"),
    ("duke", "Duke Cancer Institute"),
    ("mgh", "Massachusetts General Hospital"),
    ("bidmc", "Beth Israel Deaconess Medical Center"),
    ("brigham", "Brigham and Women's Hospital"),
    ("upenn", "Penn Medicine Abramson Cancer Center"),
    ("jefferson", "Sidney Kimmel Cancer Center at Jefferson"),
    ("uflorida", "UF Health Cancer Center"),
    ("usc", "USC Norris Comprehensive Cancer Center"),
    ("utsw", "UT Southwestern Simmons Comprehensive Cancer Center"),
    // UC system
    ("ucsd", "UC San Diego Moores Cancer Center"),
    ("ucirvine", "UC Irvine Chao Family Comprehensive Cancer Center"),
    ("ucla", "UCLA Jonsson Comprehensive Cancer Center"),
    ("ucdavis", "UC Davis Comprehensive Cancer Center"),
    ("ucsf", "UCSF Helen Diller Family Comprehensive Cancer Center"),
    // Baylor
    ("baylorscott", "Baylor Scott & White"),
    ("bcm", "Baylor College of Medicine"),
    // Other US
    ("atlantichealth", "Atlantic Health System"),
    ("northwell", "Northwell Health"),
    ("ochsner", "Ochsner Cancer Institute"),
    ("mcw", "Medical College of Wisconsin"),
    ("hoag", "Hoag Family Cancer Institute"),
    ("christhospital", "The Christ Hospital"),
    ("stephenson", "Stephenson Cancer Center"),
    ("mountsinai", "Mount Sinai Health System"),
    ("hackensack", "Hackensack University Medical Center"),
    ("lehighvalley", "Lehigh Valley Health Network"),
    ("marycrowley", "Mary Crowley Cancer Research"),
    ("swedish", "Swedish Cancer Institute"),
    ("virginiamason", "Virginia Mason Medical Center"),
    ("casewestern", "Case Western Reserve University"),
    ("honorhealth", "HonorHealth Research Institute"),
    ("ironwood", "Ironwood Cancer & Research Centers"),
    ("communityhealth", "Community Health Network"),
    ("miriam", "The Miriam Hospital"),
    ("rihospital", "Rhode Island Hospital"),
    ("westchester", "West Chester Hospital"),
    // Canada
    ("princessmargaret", "Princess Margaret Cancer Centre"),
    ("ottawahospital", "The Ottawa Hospital Cancer Centre"),
    // Australia
    ("petermac", "Peter MacCallum Cancer Centre"),
    ("lifehouse", "Chris O'Brien Lifehouse"),
    ("alfred", "The Alfred Hospital"),
    ("kinghorn", "Kinghorn Cancer Centre"),
    ("stvincent", "St Vincent's Hospital"),
    ("monash", "Monash Health"),
    // Europe
    ("gustaveroussy", "Gustave Roussy"),
    ("leonberard", "Centre L\u{e9}on B\u{e9}rard"),
    ("claudiusregaud", "Institut Claudius Regaud"),
    ("charite", "Charit\u{e9} - Universit\u{e4}tsmedizin Berlin"),
    ("vallhebron", "Vall d'Hebron Institute of Oncology"),
    ("12octubre", "Hospital Universitario 12 de Octubre"),
    ("jimenezdiaz", "Fundaci\u{f3}n Jim\u{e9}nez D\u{ed}az"),
    // Japan
    ("nccheast", "National Cancer Center Hospital East"),
    ("ncch", "National Cancer Center Hospital"),
    ("jfcr", "Cancer Institute Hospital of JFCR"),
    ("aichi", "Aichi Cancer Center"),
    ("kanagawa", "Kanagawa Cancer Center"),
    ("shizuoka", "Shizuoka Cancer Center"),
    ("shikoku", "Shikoku Cancer Center"),
    ("osakainternational", "Osaka International Cancer Institute"),
    ("kansai", "Kansai Medical University Hospital"),
    ("kindai", "Kindai University Hospital"),
    ("hokkaido", "Hokkaido University Hospital"),
    ("tohoku", "Tohoku University Hospital"),
    ("yamaguchi", "Yamaguchi University Hospital"),
    // China
    ("fudan", "Fudan University Shanghai Cancer Center"),
    ("beijingcancer", "Beijing Cancer Hospital"),
    ("harbin", "Harbin Medical University Cancer Hospital"),
    ("cams", "Cancer Hospital, Chinese Academy of Medical Sciences"),
    ("shanghaizhongshan", "Zhongshan Hospital, Fudan University"),
    ("shanghaichest", "Shanghai Chest Hospital"),
    ("shanghaipudong", "Shanghai Pudong Hospital"),
    ("shanghaieast", "Shanghai East Hospital"),
    ("yunnancancer", "Yunnan Cancer Hospital"),
    ("jiangxicancer", "Jiangxi Cancer Hospital"),
    ("guangdongpharma", "Guangdong Pharmaceutical University Hospital"),
    ("plageneralhospital", "Chinese PLA General Hospital"),
    // Korea / Singapore / Taiwan / HK / NZ
    ("asan", "Asan Medical Center"),
    ("snuh", "Seoul National University Hospital"),
    ("severance", "Severance Hospital"),
    ("nccs", "National Cancer Centre Singapore"),
    ("nuh", "National University Hospital Singapore"),
    ("ttsh", "Tan Tock Seng Hospital"),
    ("ntuh", "National Taiwan University Hospital"),
    ("ncku", "National Cheng Kung University Hospital"),
    ("taipeivet", "Taipei Veterans General Hospital"),
    ("queenmary", "Queen Mary Hospital"),
    ("princeofwales", "Prince of Wales Hospital"),
    ("auckland", "Auckland City Hospital"),
];

static CANONICAL_BY_KEYWORD: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| PREFERRED_CANONICAL.iter().copied().collect());

/// Extract the distinctive keyword for an institution name.
///
/// Matching is case-insensitive; the returned set has cardinality 0 or 1 (a
/// set only for extensibility). The exact-match table is consulted first, then
/// the ordered phrase table with a stop on the first hit - later rules are
/// never evaluated once one matches.
pub fn extract_keywords(name: &str) -> HashSet<&'static str> {
    let n = name.to_lowercase().trim().to_string();

    let mut keywords = HashSet::new();

    for (token, keyword) in EXACT_MATCHES {
        if n == *token {
            keywords.insert(*keyword);
            return keywords;
        }
    }

    for (phrase, keyword) in KEY_IDENTIFIERS {
        if n.contains(phrase) {
            keywords.insert(*keyword);
            break;
        }
    }

    keywords
}

/// Curated display name for a keyword, if one exists.
pub fn canonical_name_for(keyword: &str) -> Option<&'static str> {
    CANONICAL_BY_KEYWORD.get(keyword).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_specific_rule_wins() {
        let keywords = extract_keywords("Banner MD Anderson Cancer Center (Gilbert, AZ)");
        assert_eq!(keywords.len(), 1);
        assert!(keywords.contains("banner"));
        assert!(!keywords.contains("mdanderson"));
    }

    #[test]
    fn general_rule_still_reachable() {
        let keywords = extract_keywords("University of Texas MD Anderson Cancer Center");
        assert!(keywords.contains("mdanderson"));
    }

    #[test]
    fn at_most_one_keyword() {
        // "Sidney Kimmel Cancer Center at Jefferson" could match both the
        // hopkins and jefferson rules; first-match-wins picks hopkins.
        let keywords = extract_keywords("Sidney Kimmel Cancer Center at Jefferson University");
        assert_eq!(keywords.len(), 1);
        assert!(keywords.contains("hopkins"));
    }

    #[test]
    fn exact_match_short_circuit() {
        assert!(extract_keywords("START").contains("start"));
        assert!(extract_keywords("  next ").contains("nextoncology"));
        assert!(extract_keywords("SCRI").contains("sarahcannon"));
        // The short token must match the whole name, not a substring.
        assert!(extract_keywords("Restart Wellness Clinic").is_empty());
    }

    #[test]
    fn unknown_name_yields_empty_set() {
        assert!(extract_keywords("Smalltown Community Hospital").is_empty());
        assert!(extract_keywords("").is_empty());
    }

    #[test]
    fn every_table_keyword_has_a_display_name() {
        for (_, keyword) in KEY_IDENTIFIERS {
            assert!(
                canonical_name_for(keyword).is_some(),
                "no canonical name for keyword {keyword}"
            );
        }
        for (_, keyword) in EXACT_MATCHES {
            assert!(canonical_name_for(keyword).is_some());
        }
    }
}
