use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

#[derive(Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Shorten `s` to at most `max_len` characters, marking the cut with "..."
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// A two-column table in the CLI's house style
pub fn key_value_table<'a>(header: [&str; 2], rows: impl IntoIterator<Item = (&'a str, String)>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for (key, value) in rows {
        table.add_row([key.to_string(), value]);
    }
    table
}

pub fn print_json(value: &impl serde::Serialize) -> crate::error::CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string_short_input_unchanged() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_string_long_input() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_string_multibyte() {
        assert_eq!(truncate_string("🎯🎯🎯🎯🎯🎯", 5), "🎯🎯...");
    }

    #[test]
    fn test_key_value_table_renders_rows() {
        let table = key_value_table(["Field", "Value"], [("time", "07:00".to_string())]);
        let rendered = table.to_string();
        assert!(rendered.contains("Field"));
        assert!(rendered.contains("07:00"));
    }
}
