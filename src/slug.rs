use std::collections::HashSet;

use uuid::Uuid;

/// Which table a slug must be unique within. Project and page slugs are
/// independent uniqueness domains.
#[derive(Debug, Clone, Copy)]
pub enum SlugScope {
    Projects,
    Pages,
}

impl SlugScope {
    fn table(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Pages => "pages",
        }
    }
}

// Folds the Latin-1 accented letters that show up in real titles; anything
// else non-alphanumeric becomes a separator.
fn ascii_fold(ch: char) -> char {
    match ch {
        '\u{e0}'..='\u{e5}' => 'a',
        '\u{e8}'..='\u{eb}' => 'e',
        '\u{ec}'..='\u{ef}' => 'i',
        '\u{f2}'..='\u{f6}' => 'o',
        '\u{f9}'..='\u{fc}' => 'u',
        '\u{f1}' => 'n',
        '\u{e7}' => 'c',
        '\u{fd}' | '\u{ff}' => 'y',
        _ => ch,
    }
}

/// Lowercase, hyphen-separated, ASCII-transliterated form of a title.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(ascii_fold)
        .map(|ch| match ch {
            'a'..='z' | '0'..='9' => ch,
            _ => '-',
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// First free candidate among `base`, `base-1`, `base-2`, ...
fn unique_slug(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut num = 1;
    loop {
        let candidate = format!("{base}-{num}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        num += 1;
    }
}

/// Compute the slug to persist for an entity.
///
/// An already-set slug is kept as the base and never recomputed from the
/// title; otherwise the base is derived from the title. The base is then
/// suffixed until it collides with no other row in the scope's table,
/// ignoring the entity's own row (`exclude`) so re-saving an entity keeps
/// its slug. The check and the eventual insert are not atomic; the unique
/// column constraint backstops the race.
pub async fn assign_slug(
    executor: impl sqlx::PgExecutor<'_>,
    scope: SlugScope,
    title: &str,
    current: Option<&str>,
    exclude: Option<Uuid>,
) -> Result<String, sqlx::Error> {
    let base = match current {
        Some(slug) if !slug.is_empty() => slug.to_string(),
        _ => {
            let derived = slugify(title);
            if derived.is_empty() {
                // A title with no alphanumerics still needs a non-empty slug.
                "untitled".to_string()
            } else {
                derived
            }
        }
    };

    let sql = format!(
        "SELECT slug FROM {} WHERE (slug = $1 OR slug LIKE $2) AND ($3::uuid IS NULL OR uuid <> $3)",
        scope.table()
    );
    let taken: HashSet<String> = sqlx::query_scalar::<_, String>(&sql)
        .bind(&base)
        .bind(format!("{base}-%"))
        .bind(exclude)
        .fetch_all(executor)
        .await?
        .into_iter()
        .collect();

    Ok(unique_slug(&base, &taken))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taken(slugs: &[&str]) -> HashSet<String> {
        slugs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("My Docs"), "my-docs");
        assert_eq!(slugify("Hello  World"), "hello-world");
        assert_eq!(slugify("Gu\u{ed}a R\u{e1}pida 2024"), "guia-rapida-2024");
        assert_eq!(slugify("--Already--Hyphenated--"), "already-hyphenated");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn first_entity_keeps_unsuffixed_slug() {
        assert_eq!(unique_slug("my-docs", &taken(&[])), "my-docs");
    }

    #[test]
    fn collisions_get_numeric_suffixes_in_order() {
        assert_eq!(unique_slug("my-docs", &taken(&["my-docs"])), "my-docs-1");
        assert_eq!(
            unique_slug("my-docs", &taken(&["my-docs", "my-docs-1"])),
            "my-docs-2"
        );
        assert_eq!(
            unique_slug("my-docs", &taken(&["my-docs", "my-docs-2"])),
            "my-docs-1"
        );
    }

    #[test]
    fn unrelated_slugs_do_not_collide() {
        assert_eq!(
            unique_slug("my-docs", &taken(&["my-docs-extra", "other"])),
            "my-docs"
        );
    }
}
