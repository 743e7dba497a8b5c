//! Forum topics and posts: queries, commands and page view models

mod presenter;
mod repository;
mod service;
mod settings;
mod topic;
mod views;

pub mod errors;

pub use presenter::{paginate, post_actions, ForumTopicPresenter};
pub use repository::ForumRepository;
pub use service::{ForumTopicService, ForumTopicServiceImpl, PostsPage};
pub use settings::ForumSettings;
pub use topic::{Author, Category, NewPost, NewTopic, Post, PostChange, Topic, TopicChanges, TopicInput};
pub use views::{
    ActionKind, ActionLink, CategoryOption, PageLink, Pagination, PostFormView, PostRow,
    TopicFormView, TopicPage,
};

#[cfg(test)]
pub mod tests {
    pub use super::repository::MockForumRepository;
    pub use super::service::MockForumTopicService;
    pub use super::topic::tests::*;
}
