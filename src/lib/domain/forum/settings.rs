//! Forum display settings

use clap::Parser;

/// Forum display settings
#[derive(Clone, Debug, Parser)]
pub struct ForumSettings {
    /// Posts shown per topic page
    #[arg(long, env = "FORUM_POSTS_PER_PAGE", default_value_t = 20)]
    pub posts_per_page: i64,

    /// `strftime` date format
    #[arg(long, env = "DATE_FORMAT", default_value = "%d.%m.%Y")]
    pub date_format: String,

    /// `strftime` time format
    #[arg(long, env = "TIME_FORMAT", default_value = "%H:%M")]
    pub time_format: String,
}

impl Default for ForumSettings {
    fn default() -> Self {
        Self {
            posts_per_page: 20,
            date_format: "%d.%m.%Y".to_string(),
            time_format: "%H:%M".to_string(),
        }
    }
}
