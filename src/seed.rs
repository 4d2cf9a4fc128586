use tracing::info;

use crate::errors::AppError;
use crate::store::{DirectoryStore, PageConfig, SubcategoryEntry};

struct PageSeed {
    page_id: &'static str,
    title: &'static str,
    description: &'static str,
    search_query: &'static str,
    subcategories: &'static [&'static str],
}

const PAGES: [PageSeed; 5] = [
    PageSeed {
        page_id: "faithchristianliving",
        title: "Faith & Christian Living",
        description: "Sermons that focus on daily living in Christ's love, discipleship, and spiritual growth.",
        search_query: "Faith Christian Living sermons",
        subcategories: &["Grace", "Salvation", "Prayer", "Worship", "Spiritual Growth"],
    },
    PageSeed {
        page_id: "churchleadership",
        title: "Church & Leadership",
        description: "Sermons that promote church leadership principles, community, and commitment.",
        search_query: "Church Leadership sermons",
        subcategories: &["Leadership", "Membership", "Stewardship", "Church History"],
    },
    PageSeed {
        page_id: "biblicalbooks",
        title: "Biblical Books & Teachings",
        description: "Sermons derived from books of the Bible, discussing foundational texts and teachings.",
        search_query: "Biblical Books sermons",
        subcategories: &["Genesis", "Psalms", "Gospels", "Romans", "Revelation"],
    },
    PageSeed {
        page_id: "apologeticsendtimes",
        title: "Apologetics & End Times",
        description: "Sermons on defending the faith, prophecy, and understanding the end times.",
        search_query: "Christian apologetics sermons",
        subcategories: &[
            "Defending the Christian Faith",
            "Understanding Doctrine & Biblical Interpretation",
            "Signs of the Last Days & Biblical Prophecy",
            "The Book of Revelation & End Times Theology",
        ],
    },
    PageSeed {
        page_id: "testimonies",
        title: "Testimonies & Personal Stories",
        description: "Powerful personal accounts and testimonies that inspire and uplift.",
        search_query: "Christian testimonies sermons",
        subcategories: &[
            "Conversion Stories",
            "Miracle Testimonies",
            "Overcoming Struggles",
            "Living Out Faith",
        ],
    },
];

const SUBCATEGORY_KEYS: [(&str, &str); 22] = [
    ("Grace", "YOUTUBE_API_KEY_GRACE"),
    ("Salvation", "YOUTUBE_API_KEY_SALVATION"),
    ("Prayer", "YOUTUBE_API_KEY_PRAYER"),
    ("Worship", "YOUTUBE_API_KEY_WORSHIP"),
    ("Spiritual Growth", "YOUTUBE_API_KEY_SPIRITUAL_GROWTH"),
    ("Leadership", "YOUTUBE_API_KEY_LEADERSHIP"),
    ("Membership", "YOUTUBE_API_KEY_MEMBERSHIP"),
    ("Stewardship", "YOUTUBE_API_KEY_STEWARDSHIP"),
    ("Church History", "YOUTUBE_API_KEY_CHURCH_HISTORY"),
    ("Genesis", "YOUTUBE_API_KEY_GENESIS"),
    ("Psalms", "YOUTUBE_API_KEY_PSALMS"),
    ("Gospels", "YOUTUBE_API_KEY_GOSPELS"),
    ("Romans", "YOUTUBE_API_KEY_ROMANS"),
    ("Revelation", "YOUTUBE_API_KEY_REVELATION"),
    ("Defending the Christian Faith", "YOUTUBE_API_KEY_DEFENDING_FAITH"),
    ("Understanding Doctrine & Biblical Interpretation", "YOUTUBE_API_KEY_DOCTRINE"),
    ("Signs of the Last Days & Biblical Prophecy", "YOUTUBE_API_KEY_BIBLICAL_PROPHECY"),
    ("The Book of Revelation & End Times Theology", "YOUTUBE_API_KEY_END_TIMES"),
    ("Conversion Stories", "YOUTUBE_API_KEY_CONVERSION_STORIES"),
    ("Miracle Testimonies", "YOUTUBE_API_KEY_MIRACLE_TESTIMONIES"),
    ("Overcoming Struggles", "YOUTUBE_API_KEY_OVERCOMING_STRUGGLES"),
    ("Living Out Faith", "YOUTUBE_API_KEY_LIVING_FAITH"),
];

pub fn default_pages() -> Vec<PageConfig> {
    PAGES
        .iter()
        .map(|seed| PageConfig {
            page_id: seed.page_id.to_string(),
            title: seed.title.to_string(),
            description: seed.description.to_string(),
            search_query: seed.search_query.to_string(),
            default_sort: "relevance".to_string(),
            subcategories: seed.subcategories.iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}

pub fn default_subcategories() -> Vec<SubcategoryEntry> {
    SUBCATEGORY_KEYS
        .iter()
        .map(|(subcategory, api_key_name)| SubcategoryEntry {
            subcategory: subcategory.to_string(),
            api_key_name: api_key_name.to_string(),
        })
        .collect()
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub pages: usize,
    pub subcategories: usize,
}

/// Writes the built-in page layouts and subcategory credential names. Safe to rerun.
#[tracing::instrument(name = "Seed directory", skip(store))]
pub async fn seed_directory(store: &dyn DirectoryStore) -> Result<SeedReport, AppError> {
    let mut report = SeedReport::default();

    for page in default_pages() {
        store.upsert_page(&page).await?;
        report.pages += 1;
    }
    for entry in default_subcategories() {
        store.upsert_subcategory(&entry).await?;
        report.subcategories += 1;
    }

    info!(
        pages = report.pages,
        subcategories = report.subcategories,
        "Directory seeded"
    );
    Ok(report)
}
