use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::{access::Tier, frontmatter::FrontMatter};

const STYLE: &str = "
body { font-family: sans-serif; margin: 0; }
header { padding: 0.5em 1em; border-bottom: 1px solid #999; }
nav { float: left; width: 14em; padding: 1em; }
main { margin-left: 16em; padding: 1em; }
.notice { padding: 0.5em; margin-bottom: 1em; border-radius: 4px; }
.success { background: #d4edda; } .info { background: #d1ecf1; }
.warning { background: #fff3cd; } .error { background: #f8d7da; }
pre { background: #f4f4f4; padding: 0.5em; overflow-x: auto; }
";

const FRONT_MATTER_EXAMPLE: &str = r#"---
title: "Document title"
대분류: "Personal"
중분류: "Study"
소분류: "Rust"
tags: ["tag1", "tag2"]
access_level: "personal"/"work"/"admin"
---
Document body...
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Success,
    Info,
    Warning,
    Error,
}

impl Kind {
    fn class(self) -> &'static str {
        match self {
            Kind::Success => "notice success",
            Kind::Info => "notice info",
            Kind::Warning => "notice warning",
            Kind::Error => "notice error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Notice {
    pub kind: Kind,
    pub text: String,
}

impl Notice {
    pub fn new(kind: Kind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

fn background(tier: Option<Tier>) -> &'static str {
    match tier {
        Some(Tier::Admin) => "#ffd6d6",
        Some(Tier::Work) => "#d6dfff",
        None => "#ffffff",
    }
}

pub(super) fn document_href(filename: &str) -> String {
    format!("/documents/{}", urlencoding::encode(filename))
}

fn layout(tier: Option<Tier>, notices: &[Notice], content: Markup) -> String {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "my-minimal-git-journal" }
                style { (PreEscaped(STYLE)) }
            }
            body style=(format!("background-color: {};", background(tier))) {
                header { h1 { "Minimal Git Journal" } }
                @if let Some(tier) = tier {
                    nav {
                        p { "Current user: " strong { (tier) } }
                        ul {
                            li { a href="/documents" { "View documents" } }
                            li { a href="/documents/new" { "New document (markdown)" } }
                            li { a href="/publish" { "Build & deploy site" } }
                        }
                        form method="post" action="/logout" {
                            button type="submit" { "Log out" }
                        }
                    }
                }
                main {
                    @for notice in notices {
                        div class=(notice.kind.class()) { (notice.text) }
                    }
                    (content)
                }
            }
        }
    }
    .into()
}

pub(super) fn login(notices: &[Notice]) -> String {
    layout(
        None,
        notices,
        html! {
            h2 { "Log in" }
            form method="post" action="/login" {
                p { label { "ID " input type="text" name="id"; } }
                p { label { "Password " input type="password" name="password"; } }
                button type="submit" { "Log in" }
            }
        },
    )
}

pub(super) fn documents(tier: Tier, docs: &[(String, FrontMatter)], notices: &[Notice]) -> String {
    layout(
        Some(tier),
        notices,
        html! {
            h2 { "Documents" }
            @if docs.is_empty() {
                div class=(Kind::Warning.class()) { "No documents you can access." }
            }
            @for (filename, meta) in docs {
                section {
                    h3 { (meta.title) " (" (filename) ")" }
                    ul {
                        li { "대분류: " (meta.major) }
                        li { "중분류: " (meta.mid) }
                        li { "소분류: " (meta.minor) }
                        li { "Tags: " (meta.tags.join(", ")) }
                        li { "Access: " (meta.access) }
                    }
                    @if tier.can_modify() {
                        a href=(document_href(filename)) { "Edit / delete" }
                    }
                    hr;
                }
            }
        },
    )
}

pub(super) fn new_document(tier: Tier, draft: &str, notices: &[Notice]) -> String {
    layout(
        Some(tier),
        notices,
        html! {
            h2 { "New document" }
            p { "Start with a front matter block like this one:" }
            pre { (FRONT_MATTER_EXAMPLE) }
            form method="post" action="/documents" {
                textarea name="markdown" rows="20" cols="90" { (draft) }
                p { button type="submit" { "Save" } }
            }
        },
    )
}

pub(super) fn document(
    tier: Tier,
    filename: &str,
    meta: &FrontMatter,
    content: Option<&str>,
    notices: &[Notice],
) -> String {
    let href = document_href(filename);
    layout(
        Some(tier),
        notices,
        html! {
            h2 { "Edit / delete " (filename) }
            ul {
                li { "Title: " (meta.title) }
                li { "Access: " (meta.access) }
                li { "대분류: " (meta.major) }
                li { "중분류: " (meta.mid) }
                li { "소분류: " (meta.minor) }
                li { "Tags: " (meta.tags.join(", ")) }
            }
            details {
                summary { "Full document" }
                @if let Some(content) = content {
                    pre { (content) }
                } @else {
                    div class=(Kind::Warning.class()) { "The document file was not found." }
                }
            }
            form method="post" action=(format!("{href}/delete")) {
                button type="submit" { "Delete document" }
            }
            h3 { "Edit" }
            form method="post" action=(format!("{href}/edit")) {
                p { label { "New title " input type="text" name="title" value=(meta.title); } }
                p { "New body (without front matter)" }
                textarea name="body" rows="12" cols="90" {}
                p { button type="submit" { "Save changes" } }
            }
        },
    )
}

pub(super) fn publish(tier: Tier, notices: &[Notice]) -> String {
    layout(
        Some(tier),
        notices,
        html! {
            h2 { "Build & deploy site" }
            p { "Runs the site build, then publishes it. Works only where the toolchain is installed." }
            form method="post" action="/publish" {
                button type="submit" { "Build and deploy" }
            }
        },
    )
}

pub(super) fn message(tier: Option<Tier>, notices: &[Notice]) -> String {
    layout(tier, notices, html! {})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_user_text() {
        let meta = FrontMatter {
            title: "<script>".to_string(),
            ..Default::default()
        };
        let page = documents(Tier::Work, &[("a.md".to_string(), meta)], &[]);
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
        assert!(!page.contains("Edit / delete"));
    }

    #[test]
    fn colours_follow_the_tier() {
        assert!(login(&[]).contains("background-color: #ffffff;"));
        assert!(publish(Tier::Admin, &[]).contains("background-color: #ffd6d6;"));
        assert!(publish(Tier::Work, &[]).contains("background-color: #d6dfff;"));
    }

    #[test]
    fn document_links_are_encoded() {
        assert_eq!(document_href("2024-03-09-#1.md"), "/documents/2024-03-09-%231.md");
    }
}
