//! Form descriptors returned alongside create, edit and detail contexts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of input a form field takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Choice,
    Image,
}

/// A selectable option of a choice field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

/// One input of a form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    /// Current value when editing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<Value>,
}

impl FormField {
    const fn new(name: &'static str, label: &'static str, kind: FieldKind, required: bool) -> Self {
        Self {
            name,
            label,
            kind,
            required,
            help_text: None,
            choices: Vec::new(),
            initial: None,
        }
    }

    fn help(mut self, text: &'static str) -> Self {
        self.help_text = Some(text);
        self
    }

    fn initial(mut self, value: Option<Value>) -> Self {
        self.initial = value;
        self
    }
}

/// A form a client can render and submit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormDescriptor {
    /// Where the form is submitted.
    pub action: String,
    pub fields: Vec<FormField>,
}

/// Post form values shown when editing.
#[derive(Debug, Clone, Default)]
pub struct PostFormInitial {
    pub text: Option<String>,
    pub group_id: Option<String>,
    pub image: Option<String>,
}

/// The post form, with the available groups as choices.
#[must_use]
pub fn post_form(action: String, groups: Vec<Choice>, initial: PostFormInitial) -> FormDescriptor {
    let mut group = FormField::new("group", "Group", FieldKind::Choice, false)
        .help("Group the post will belong to")
        .initial(initial.group_id.map(Value::String));
    group.choices = groups;

    FormDescriptor {
        action,
        fields: vec![
            FormField::new("text", "Post text", FieldKind::Text, true)
                .help("Text of the new post")
                .initial(initial.text.map(Value::String)),
            group,
            FormField::new("image", "Image", FieldKind::Image, false)
                .help("Upload through the media endpoint and pass the returned key")
                .initial(initial.image.map(Value::String)),
        ],
    }
}

/// The comment form shown under a post.
#[must_use]
pub fn comment_form(action: String) -> FormDescriptor {
    FormDescriptor {
        action,
        fields: vec![
            FormField::new("text", "Comment text", FieldKind::Text, true)
                .help("Text of the comment"),
        ],
    }
}
