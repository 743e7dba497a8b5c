//! Forum page templates

use askama::Template;

use crate::domain::forum::{PostFormView, TopicFormView, TopicPage};

/// Topic page with its posts
#[derive(Debug, Template)]
#[template(path = "forum/topic.html")]
pub struct TopicTemplate {
    /// The page to render
    pub page: TopicPage,
}

/// Create or edit a topic
#[derive(Debug, Template)]
#[template(path = "forum/topic_form.html")]
pub struct TopicFormTemplate {
    /// The form to render
    pub form: TopicFormView,
}

/// Reply to a topic or edit a post
#[derive(Debug, Template)]
#[template(path = "forum/post_form.html")]
pub struct PostFormTemplate {
    /// The form to render
    pub form: PostFormView,
}
