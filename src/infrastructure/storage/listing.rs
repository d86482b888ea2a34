//! SQL rendering of archive/template list filters

use sqlx::{Postgres, QueryBuilder};

use crate::domain::listing::{
    CategoryFilter, ListFilter, PURPOSE_OPTIONS, RELATIONSHIP_OPTIONS, TONE_OPTIONS,
};
use crate::domain::user::UserId;

/// Escape `%`, `_` and `\` for an `ILIKE ... ESCAPE '\'` pattern
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

/// Append `WHERE user_id = .. AND ..` for `filter`
pub fn push_list_filter(
    builder: &mut QueryBuilder<'_, Postgres>,
    user_id: &UserId,
    filter: &ListFilter,
) {
    builder.push(" WHERE user_id = ");
    builder.push_bind(user_id.as_uuid());

    if let Some(ref q) = filter.search {
        let pattern = format!("%{}%", escape_like(q));
        builder.push(" AND (content ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR title ILIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\')");
    }

    push_category(builder, "tone", filter.tone.as_ref(), TONE_OPTIONS);
    push_category(
        builder,
        "relationship",
        filter.relationship.as_ref(),
        RELATIONSHIP_OPTIONS,
    );
    push_category(builder, "purpose", filter.purpose.as_ref(), PURPOSE_OPTIONS);

    if let Some(from) = filter.created_from {
        builder.push(" AND created_at >= ");
        builder.push_bind(from);
    }

    if let Some(to) = filter.created_to {
        builder.push(" AND created_at <= ");
        builder.push_bind(to);
    }
}

fn push_category(
    builder: &mut QueryBuilder<'_, Postgres>,
    column: &'static str,
    filter: Option<&CategoryFilter>,
    predefined: &[&str],
) {
    match filter {
        Some(CategoryFilter::Exact(value)) => {
            builder.push(format!(" AND {} = ", column));
            builder.push_bind(value.clone());
        }
        Some(CategoryFilter::Other) => {
            let options: Vec<String> = predefined.iter().map(|s| s.to_string()).collect();
            builder.push(format!(" AND {} IS NOT NULL AND {} <> ALL(", column, column));
            builder.push_bind(options);
            builder.push(")");
        }
        None => {}
    }
}
