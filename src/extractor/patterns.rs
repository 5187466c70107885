//! Immutable selector and phrase tables used by the content strategies.
//!
//! Everything heuristic about extraction lives here as data: ordered
//! selector cascades, navigation/boilerplate phrase lists, and the
//! per-source sidebar tables. The strategies iterate these tables instead
//! of hardcoding site knowledge in control flow, so a new recurring noise
//! fragment is a one-line table edit.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;

/// The Devanagari sentence terminator (purna viram).
pub const PURNA_VIRAM: char = '।';

fn sel(css: &str) -> Selector {
    // All selectors here are fixed literals; a parse failure is a programming
    // error caught by the table tests below.
    Selector::parse(css).unwrap()
}

fn compile(table: &[&'static str]) -> Vec<(&'static str, Selector)> {
    table.iter().map(|css| (*css, sel(css))).collect()
}

/// Body-content selectors for the generic strategy, in order of preference:
/// Nepali-news-specific classes first, then semantic HTML, common content
/// containers, generic class patterns, IDs, and finally page landmarks.
pub static ARTICLE_SELECTORS: Lazy<Vec<(&'static str, Selector)>> = Lazy::new(|| {
    compile(&[
        ".news-detail-content",
        ".article-detail",
        ".news-content",
        ".news-body",
        ".detail-content",
        ".story-content",
        ".post-detail",
        "#ctl00_ContentPlaceHolder1_NewsDetailPanel",
        ".news-detail",
        "#ContentPlaceHolder1_NewsDetailPanel",
        "[id*=\"NewsDetail\"]",
        "article",
        "main article",
        "[role=\"main\"] article",
        ".post-content",
        ".entry-content",
        ".article-content",
        ".content-area",
        ".post-body",
        ".article-body",
        "div[class*=\"content\"]",
        "div[class*=\"post\"]",
        "div[class*=\"article\"]",
        "div[class*=\"body\"]",
        "div[class*=\"text\"]",
        "#content",
        "#main-content",
        "#article-content",
        "main",
        ".main",
        "#main",
    ])
});

/// Title selectors, most specific heading classes first.
pub static TITLE_SELECTORS: Lazy<Vec<(&'static str, Selector)>> = Lazy::new(|| {
    compile(&[
        "h1.entry-title",
        "h1.post-title",
        "h1.article-title",
        ".title h1",
        "article h1",
        "h1",
        "title",
    ])
});

/// Author/byline selectors.
pub static AUTHOR_SELECTORS: Lazy<Vec<(&'static str, Selector)>> = Lazy::new(|| {
    compile(&[
        ".author",
        ".byline",
        ".post-author",
        ".article-author",
        ".author-name",
        "[rel=\"author\"]",
        ".writer",
        ".journalist",
    ])
});

/// Published-date selectors; structured `datetime`/`content` attributes are
/// preferred over element text.
pub static DATE_SELECTORS: Lazy<Vec<(&'static str, Selector)>> = Lazy::new(|| {
    compile(&[
        "time[datetime]",
        ".published",
        ".post-date",
        ".article-date",
        ".date",
        ".timestamp",
        "meta[property=\"article:published_time\"]",
        "meta[name=\"publish-date\"]",
    ])
});

/// Wider publish-time selector sweep tried before the domain-specific
/// routines.
pub static TIME_SELECTORS: Lazy<Vec<(&'static str, Selector)>> = Lazy::new(|| {
    compile(&[
        "time[datetime]",
        ".publish-date",
        ".published-date",
        ".date-published",
        ".article-date",
        ".post-date",
        ".news-date",
        ".meta-date",
        ".entry-date",
        ".timestamp",
        "[class*=\"date\"]",
        "[class*=\"time\"]",
        ".article-meta time",
        ".post-meta time",
    ])
});

/// Meta containers scanned by the nepalipaisa date routine.
pub static NEPALIPAISA_META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| sel(".article-meta, .post-meta, .news-meta"));

/// Date containers scanned by the bikashnews date routine.
pub static BIKASHNEWS_DATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| sel(".date, .published, .article-date"));

/// Time containers scanned by the merolagani date routine.
pub static MEROLAGANI_TIME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| sel(".time, .date, .published"));

/// Navigation-menu phrase fragments. Any candidate containing one of these
/// (case-insensitive) is rejected at every cascade tier.
pub const NAV_PATTERNS: &[&str] = &[
    "Home News Latest News Stock Market",
    "Popular News Interviews Market Analysis",
    "Investment Opportunities IPO FPO",
    "Contact Us Feedback FAQ",
    "Training Calculator",
    "Share Manager Portfolio",
];

/// Boilerplate phrases stripped from the beginning and end of final text.
pub const CLEANUP_PATTERNS: &[&str] = &[
    "Nepali Paisa In this article:",
    "Top Stories",
    "Related News",
    "Share this article",
    "Follow us on",
    "Subscribe to",
    "Advertisement",
];

/// Class/id substrings that mark an element as sidebar or related-content.
pub const SIDEBAR_INDICATORS: &[&str] = &[
    "sidebar",
    "related",
    "popular",
    "trending",
    "more-news",
    "right-column",
    "side-content",
    "widget",
    "advertisement",
];

/// Extra sidebar indicators specific to the bikashnews story layout.
pub const BIKASH_SIDEBAR_INDICATORS: &[&str] = &["share-news", "social-share", "pdf-viewer"];

/// Main-container selectors for the bikashnews strategy.
pub static BIKASH_MAIN_SELECTORS: Lazy<Vec<(&'static str, Selector)>> = Lazy::new(|| {
    compile(&[
        "div[class*=\"story-content\"]",
        "div[class*=\"article-content\"]",
        "div[class*=\"news-content\"]",
        "div[class*=\"main-content\"]",
        ".post-content",
        "article",
        "div[id*=\"story\"]",
        "div[id*=\"article\"]",
    ])
});

/// Sidebar/related-news phrase fragments recurring on bikashnews pages.
pub const BIKASH_SIDEBAR_PHRASES: &[&str] = &[
    "Share News लोकप्रिय",
    "लाभांश सिजन",
    "नेपाल एसबिआई",
    "भूषण राणा",
    "एनआईसी एशिया बैंक",
    "सम्बन्धित खबर",
    "Loading WEBGL",
    "Loading PDF",
    "Share Previous Page",
    "Toggle Outline",
    "Zoom In",
    "Download PDF",
];

/// PDF-viewer chrome, sidebar headlines, and duplicated-byline fragments
/// rejected sentence-by-sentence on bikashnews pages.
pub const BIKASH_UNWANTED_PATTERNS: &[&str] = &[
    "Loading WEBGL 3D",
    "Loading PDF 100%",
    "Share Previous Page",
    "Toggle Outline/Bookmark",
    "Toggle Thumbnails",
    "Zoom In Zoom Out",
    "Toggle Fullscreen",
    "Download PDF File",
    "Double Page Mode",
    "Goto First Page",
    "Goto Last Page",
    "Turn on/off Sound",
    "Share News लोकप्रिय",
    "सबै पढ्नुहोस्",
    "लाभांश सिजन",
    "नेपाल एसबिआई",
    "भूषण राणा",
    "एनआईसी एशिया बैंक",
    "सम्बन्धित खबर",
    "विकासन्युज आइतबार",
    "अ अ काठमाडौं",
];

/// Short tokens whose presence in a sentence disqualifies it during the
/// final bikashnews cleanup pass.
pub const BIKASH_PARTIAL_UNWANTED: &[&str] = &[
    "Loading",
    "Share",
    "Toggle",
    "Zoom",
    "Download",
    "PDF",
    "लाभांश सिजन",
    "नेपाल एसबिआई",
    "भूषण राणा",
    "सम्बन्धित खबर",
    "विकासन्युज आइतबार",
];

/// Leading duplicated title/byline blocks on bikashnews pages: weekday name
/// followed by the dateline marker, or PDF loading chatter, up to the first
/// sentence terminator.
pub static BIKASH_START_CLEANUP_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^[^।]*विकासन्युज आइतबार[^।]*अ अ काठमाडौं\s*।\s*").unwrap(),
        Regex::new(r"^[^।]*Loading[^।]*।\s*").unwrap(),
    ]
});

/// Trailing "related news" / share sections on bikashnews pages.
pub static BIKASH_END_CLEANUP_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?s)Share News लोकप्रिय.*$").unwrap(),
        Regex::new(r"(?s)सम्बन्धित खबर.*$").unwrap(),
        Regex::new(r"(?s)Loading.*$").unwrap(),
    ]
});

/// Main-container selectors for the merolagani strategy.
pub static MEROLAGANI_MAIN_SELECTORS: Lazy<Vec<(&'static str, Selector)>> = Lazy::new(|| {
    compile(&[
        "div[class*=\"news-detail\"]",
        "div[class*=\"article-content\"]",
        "div[class*=\"main-content\"]",
        ".news-content",
        "article",
        "div[id*=\"news\"]",
        "div[id*=\"article\"]",
    ])
});

/// Recurring sidebar-headline fragments on merolagani pages.
pub const MEROLAGANI_SIDEBAR_PHRASES: &[&str] = &[
    "शेयर बजार",
    "आईपीओ",
    "कम्पनी",
    "लाभांश",
    "नेप्से",
    "ट्रयाक रकेर्ड",
    "कालो सोमबार",
    "राइट शेयर",
    "पाइपलाईन",
    "दशैं पछि",
    "मनसुन बहिर्गमन",
    "अष्टमी,नवमी",
    "टीकाकै दिन",
    "पूर्वानुमान रिपाेर्ट",
];

/// Lines that signal the end of the main article on merolagani pages:
/// neighbouring headlines, then the footer/publisher block.
pub const MEROLAGANI_END_PATTERNS: &[&str] = &[
    "दशैकाे भाेलीपल्टदेखि",
    "दशैं पछि के होला",
    "वर्षको 'ट्रयाक रकेर्ड'",
    "शेयर बजारमा 'कालो सोमबार'",
    "प्राथमिक हुदै दोस्रो बजार",
    "आईपीओ र राइट शेयर",
    "दशैँको टीकाकै दिन",
    "मनसुन बहिर्गमन",
    "अष्टमी,नवमी र दशमी",
    "मौसम पूर्वानुमान रिपाेर्ट",
    "सुचना तथा प्रसारण विभाग",
    "प्रकाशक -",
    "एस्ट्रिक टेक्नोलोजी",
    "editor@merolagani.com",
    "द.न. ४४०",
    "रिपाेर्ट सुचना तथा प्रसारण",
    "? दशैं पछि के होला",
    "? ५ वर्षको",
    "ले दिएको चेतावनी प्राथमिक",
    "पाइपलाईनमा ? दशैँको",
];

/// Tokens that disqualify a sentence during the merolagani cleanup pass.
pub const MEROLAGANI_PARTIAL_UNWANTED: &[&str] = &[
    "शेयर बजार",
    "आईपीओ",
    "राइट शेयर",
    "मनसुन बहिर्गमन",
    "प्रकाशक",
    "editor@",
    "द.न.",
    "एस्ट्रिक टेक्नोलोजी",
    "सुचना तथा प्रसारण",
    "ट्रयाक रकेर्ड",
    "कालो सोमबार",
];

/// Account/share chrome skipped when walking merolagani text nodes.
pub const MEROLAGANI_SKIP_WORDS: &[&str] = &[
    "facebook",
    "twitter",
    "whatsapp",
    "copy link",
    "popular news",
    "more",
    "log in",
    "edit account",
    "change password",
    "search",
    "verify mobile",
    "remove account",
    "log out",
    "कम्पनीले गरे लाभांश",
    "प्रतिशतसम्म लाभांश",
    "sep ",
    "am",
    "pm",
];

/// Leading `<token>:` dateline, e.g. `काठमाडौं :`.
pub static DATELINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S+\s*:\s*").unwrap());

/// Relative Nepali timestamps: "N घण्टा अगाडि" / "N मिनेट अगाडि".
pub static RELATIVE_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(घण्टा|मिनेट)\s*अगाडि").unwrap());

/// Absolute Nepali dates: "day monthName year", e.g. "२० आश्विन २०८२".
/// `\d` is Unicode-aware and matches Devanagari digits too.
pub static NEPALI_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*([^\s,\d]+)\s*(\d{4})").unwrap());

/// Map a Nepali month name (including common script variants) to its
/// ordinal, 1 through 12.
pub fn nepali_month_ordinal(name: &str) -> Option<u32> {
    match name {
        "बैशाख" | "बैसाख" => Some(1),
        "जेठ" => Some(2),
        "असार" => Some(3),
        "साउन" => Some(4),
        "भदौ" | "भाद्र" => Some(5),
        "असोज" | "आश्विन" => Some(6),
        "कार्तिक" | "कात्तिक" => Some(7),
        "मंसिर" | "मार्ग" => Some(8),
        "पुष" | "पौष" => Some(9),
        "माघ" => Some(10),
        "फागुन" => Some(11),
        "चैत" => Some(12),
        _ => None,
    }
}

/// Selectors the browser renderer waits for before capturing the DOM.
pub const RENDER_WAIT_SELECTORS: &[&str] = &[
    "article",
    ".post-content",
    ".article-content",
    ".news-content",
    ".content",
    "main",
];

/// Merolagani-specific wait selectors, tried before the generic set.
pub const MEROLAGANI_WAIT_SELECTORS: &[&str] =
    &["#ctl00_ContentPlaceHolder1_NewsDetailPanel", "[id*=\"NewsDetail\"]"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_tables_compile() {
        // force every Lazy table so an invalid selector literal fails loudly
        assert!(!ARTICLE_SELECTORS.is_empty());
        assert!(!TITLE_SELECTORS.is_empty());
        assert!(!AUTHOR_SELECTORS.is_empty());
        assert!(!DATE_SELECTORS.is_empty());
        assert!(!TIME_SELECTORS.is_empty());
        assert!(!BIKASH_MAIN_SELECTORS.is_empty());
        assert!(!MEROLAGANI_MAIN_SELECTORS.is_empty());
        Lazy::force(&NEPALIPAISA_META_SELECTOR);
        Lazy::force(&BIKASHNEWS_DATE_SELECTOR);
        Lazy::force(&MEROLAGANI_TIME_SELECTOR);
    }

    #[test]
    fn test_month_ordinals_cover_variants() {
        assert_eq!(nepali_month_ordinal("बैशाख"), Some(1));
        assert_eq!(nepali_month_ordinal("बैसाख"), Some(1));
        assert_eq!(nepali_month_ordinal("आश्विन"), Some(6));
        assert_eq!(nepali_month_ordinal("चैत"), Some(12));
        assert_eq!(nepali_month_ordinal("January"), None);
    }

    #[test]
    fn test_dateline_regex() {
        assert!(DATELINE_RE.is_match("काठमाडौं : आज बजार"));
        assert!(!DATELINE_RE.is_match("आज बजार बढ्यो"));
    }

    #[test]
    fn test_nepali_date_regex_matches_devanagari_digits() {
        let caps = NEPALI_DATE_RE.captures("२० आश्विन २०८२, सोमबार").unwrap();
        assert_eq!(&caps[1], "२०");
        assert_eq!(&caps[2], "आश्विन");
        assert_eq!(&caps[3], "२०८२");
    }

    #[test]
    fn test_relative_time_regex() {
        let caps = RELATIVE_TIME_RE.captures("२ घण्टा अगाडि").unwrap();
        assert_eq!(&caps[2], "घण्टा");
    }
}
