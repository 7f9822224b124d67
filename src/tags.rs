use crate::models::Tag;
use sqlx::PgConnection;

/// Which entity a tag set is being reconciled against.
#[derive(Debug, Clone, Copy)]
pub enum TagTarget {
    Project(i32),
    Page(i32),
}

impl TagTarget {
    fn join_table(self) -> (&'static str, &'static str) {
        match self {
            Self::Project(_) => ("project_tags", "project_id"),
            Self::Page(_) => ("page_tags", "page_id"),
        }
    }

    fn id(self) -> i32 {
        match self {
            Self::Project(id) | Self::Page(id) => id,
        }
    }
}

/// Split a comma-separated tag field into clean names: trimmed, empty
/// tokens dropped, duplicates collapsed to the first occurrence.
pub fn parse_tag_field(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for token in text.split(',') {
        let token = token.trim();
        if token.is_empty() || names.iter().any(|n| n == token) {
            continue;
        }
        names.push(token.to_string());
    }
    names
}

/// Reconstruct the editable text field from the stored tag set.
pub fn join_tag_names(tags: &[Tag]) -> String {
    tags.iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Replace the target's tag associations with the set named in `text`.
///
/// Full-replace semantics: existing associations are cleared first, then
/// each parsed name is resolved to a tag row (created on first use) and
/// attached. Runs inside the caller's transaction; callers doing a
/// deferred save simply do not call it.
pub async fn sync_tags(
    conn: &mut PgConnection,
    target: TagTarget,
    text: &str,
) -> Result<(), sqlx::Error> {
    let (join_table, fk) = target.join_table();

    let clear = format!("DELETE FROM {join_table} WHERE {fk} = $1");
    sqlx::query(&clear).bind(target.id()).execute(&mut *conn).await?;

    let attach = format!(
        "INSERT INTO {join_table} ({fk}, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
    );
    for name in parse_tag_field(text) {
        // Get-or-create; the no-op update makes RETURNING yield the row in
        // both cases.
        let tag_id: i32 = sqlx::query_scalar(
            "INSERT INTO tags (name) VALUES ($1)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING id",
        )
        .bind(&name)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query(&attach)
            .bind(target.id())
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Tags currently attached to the target, in whatever order the database
/// returns them.
pub async fn tags_for(
    executor: impl sqlx::PgExecutor<'_>,
    target: TagTarget,
) -> Result<Vec<Tag>, sqlx::Error> {
    let (join_table, fk) = target.join_table();
    let sql = format!(
        "SELECT t.id, t.name FROM tags t
         JOIN {join_table} jt ON jt.tag_id = t.id
         WHERE jt.{fk} = $1"
    );
    sqlx::query_as::<_, Tag>(&sql)
        .bind(target.id())
        .fetch_all(executor)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_and_trims() {
        assert_eq!(parse_tag_field("api, tutorial"), vec!["api", "tutorial"]);
        assert_eq!(parse_tag_field("  rust ,  web  "), vec!["rust", "web"]);
    }

    #[test]
    fn parse_drops_empty_tokens() {
        assert_eq!(parse_tag_field("a,,b, ,"), vec!["a", "b"]);
        assert!(parse_tag_field("").is_empty());
        assert!(parse_tag_field(" , ,, ").is_empty());
    }

    #[test]
    fn parse_collapses_duplicates() {
        assert_eq!(parse_tag_field("a, a, a"), vec!["a"]);
        assert_eq!(parse_tag_field("b, a, b"), vec!["b", "a"]);
    }

    #[test]
    fn join_is_comma_space_separated() {
        let tags = vec![
            Tag {
                id: 1,
                name: "api".to_string(),
            },
            Tag {
                id: 2,
                name: "tutorial".to_string(),
            },
        ];
        assert_eq!(join_tag_names(&tags), "api, tutorial");
        assert_eq!(join_tag_names(&[]), "");
    }

    #[test]
    fn replace_parse_round() {
        // Saving "a, b" then "b, c" must leave exactly {b, c}; the sync is
        // clear-then-attach, so the parsed set is what survives.
        assert_eq!(parse_tag_field("a, b"), vec!["a", "b"]);
        assert_eq!(parse_tag_field("b, c"), vec!["b", "c"]);
    }
}
