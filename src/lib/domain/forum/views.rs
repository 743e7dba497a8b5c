//! View models rendered by the forum page templates

use uuid::Uuid;

/// What an action link does
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    /// Open an edit form
    Edit,

    /// Submit a delete request
    Delete,
}

/// A permission-gated action shown next to a post
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionLink {
    /// What the link does
    pub kind: ActionKind,

    /// Link text
    pub label: String,

    /// Target URL
    pub url: String,

    /// Token submitted with state-changing actions
    pub csrf_token: Option<String>,

    /// Question to confirm before the action runs
    pub confirm: Option<String>,
}

impl ActionLink {
    /// Whether the action has to be submitted as a form
    pub fn is_form(&self) -> bool {
        self.kind == ActionKind::Delete
    }
}

/// One post as shown on the topic page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostRow {
    /// Post UUID
    pub id: Uuid,

    /// Author's full name
    pub author_name: String,

    /// URL of the author's profile photo
    pub author_photo_url: String,

    /// Formatted creation date and time
    pub created_at: String,

    /// Category label
    pub category: String,

    /// "Last edited by" line, if the post was changed
    pub last_change: Option<String>,

    /// Text split at blank lines
    pub paragraphs: Vec<String>,

    /// Actions the viewer may take, in display order
    pub actions: Vec<ActionLink>,
}

/// Link to one page of a topic
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageLink {
    /// Page number starting at 1
    pub number: i64,

    /// Target URL
    pub url: String,

    /// The page being shown
    pub current: bool,
}

/// Page navigation of a topic
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// Offset of the page being shown, aligned to `per_page`
    pub offset: i64,

    /// Posts per page
    pub per_page: i64,

    /// Posts in the topic
    pub total: i64,

    /// One link per page
    pub pages: Vec<PageLink>,
}

impl Pagination {
    /// Whether there is more than one page to navigate
    pub fn has_pages(&self) -> bool {
        self.pages.len() > 1
    }

    /// Link to the page before the current one
    pub fn previous(&self) -> Option<&PageLink> {
        let current = self.pages.iter().position(|p| p.current)?;

        current.checked_sub(1).and_then(|i| self.pages.get(i))
    }

    /// Link to the page after the current one
    pub fn next(&self) -> Option<&PageLink> {
        let current = self.pages.iter().position(|p| p.current)?;

        self.pages.get(current + 1)
    }
}

/// Everything the topic page shows
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicPage {
    /// Topic UUID
    pub topic_id: Uuid,

    /// Topic title
    pub title: String,

    /// Category label
    pub category: String,

    /// View counter including this view
    pub views: i64,

    /// Posts on this page
    pub posts: Vec<PostRow>,

    /// Page navigation
    pub pagination: Pagination,

    /// Link to the reply form, for signed-in members
    pub reply_url: Option<String>,
}

/// A category in the topic form's select box
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryOption {
    /// Category UUID
    pub id: Uuid,

    /// Category name
    pub name: String,

    /// Preselected in the form
    pub selected: bool,
}

/// The form to create or edit a topic
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicFormView {
    /// The topic being edited, [`None`] for a new topic
    pub topic_id: Option<Uuid>,

    /// Topic title
    pub title: String,

    /// Text of the first post
    pub text: String,

    /// Selectable categories
    pub categories: Vec<CategoryOption>,

    /// "Created by" or "last edited by" line of the first post
    pub last_change: Option<String>,

    /// Where the form is submitted
    pub action_url: String,

    /// Token echoed back by the form
    pub csrf_token: String,
}

/// The form to reply to a topic or edit a post
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostFormView {
    /// The topic the post belongs to
    pub topic_id: Uuid,

    /// Title of that topic
    pub topic_title: String,

    /// The post being edited, [`None`] for a reply
    pub post_id: Option<Uuid>,

    /// Post body
    pub text: String,

    /// "Created by" or "last edited by" line of the post
    pub last_change: Option<String>,

    /// Where the form is submitted
    pub action_url: String,

    /// Token echoed back by the form
    pub csrf_token: String,
}
