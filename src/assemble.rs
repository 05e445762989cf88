use crate::batch::NoteRecord;
use regex::Regex;
use tracing::trace;

/// Joins per-file notes into one Markdown document.
///
/// The document opens with `# {main_title}`; each record follows as a
/// `## {topic_name}` section, in order, with any echoed title or topic
/// heading removed from the start of its notes.
#[must_use]
pub fn assemble(main_title: &str, records: &[NoteRecord]) -> String {
    let mut document = format!("# {main_title}\n\n");

    for record in records {
        document.push_str(&format!("## {}\n\n", record.topic_name));
        document.push_str(&strip_duplicate_titles(
            &record.notes,
            main_title,
            &record.topic_name,
        ));
        document.push_str("\n\n");
    }

    document
}

/// Removes a leading heading that repeats the document title or the topic.
///
/// Backends sometimes echo either heading even when told not to. The title
/// is checked first, then the topic; each match drops the heading line
/// (levels 1 to 3, exact text) together with the blank lines after it.
#[must_use]
pub fn strip_duplicate_titles(content: &str, main_title: &str, topic_name: &str) -> String {
    let content = content.trim_start();
    let content = strip_heading(content, main_title);
    let content = strip_heading(content, topic_name);
    content.trim_start().to_string()
}

fn strip_heading<'a>(content: &'a str, text: &str) -> &'a str {
    let pattern = format!(
        r"\A#{{1,3}}[ \t]*{}[ \t]*(?:\r?\n|\z)(?:[ \t]*\r?\n)*",
        regex::escape(text)
    );

    let Ok(heading) = Regex::new(&pattern) else {
        return content;
    };

    match heading.find(content) {
        Some(found) => {
            trace!("Dropped duplicate heading '{}'", text);
            &content[found.end()..]
        }
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record(topic: &str, notes: &str) -> NoteRecord {
        NoteRecord {
            file_path: PathBuf::from("file.py"),
            topic_name: topic.to_string(),
            notes: notes.to_string(),
        }
    }

    #[test]
    fn test_assemble_layout() {
        let records = vec![
            record("Loops", "Loops repeat work."),
            record("Functions", "Functions name work."),
        ];

        let document = assemble("Python Notes", &records);
        assert_eq!(
            document,
            "# Python Notes\n\n\
             ## Loops\n\nLoops repeat work.\n\n\
             ## Functions\n\nFunctions name work.\n\n"
        );
    }

    #[test]
    fn test_assemble_without_records() {
        assert_eq!(assemble("Empty", &[]), "# Empty\n\n");
    }

    #[test]
    fn test_echoed_topic_heading_is_idempotent() {
        let with_heading = vec![record("Loops", "## Loops\n\nLoops repeat work.")];
        let without_heading = vec![record("Loops", "Loops repeat work.")];

        assert_eq!(
            assemble("Python Notes", &with_heading),
            assemble("Python Notes", &without_heading)
        );
    }

    #[test]
    fn test_strip_title_then_topic() {
        let notes = "\n\n# Python Notes\n\n\n## Loops\n\n### Range\nBody";
        assert_eq!(
            strip_duplicate_titles(notes, "Python Notes", "Loops"),
            "### Range\nBody"
        );
    }

    #[test]
    fn test_strip_only_at_start() {
        let notes = "Intro\n\n## Loops\n\nBody";
        assert_eq!(strip_duplicate_titles(notes, "Python Notes", "Loops"), notes);
    }

    #[test]
    fn test_topic_before_title_keeps_title() {
        // title is checked first, so a title after the topic survives
        let notes = "## Loops\n\n# Python Notes\n\nBody";
        assert_eq!(
            strip_duplicate_titles(notes, "Python Notes", "Loops"),
            "# Python Notes\n\nBody"
        );
    }

    #[test]
    fn test_heading_must_match_exactly() {
        let notes = "## Loops in Depth\n\nBody";
        assert_eq!(strip_duplicate_titles(notes, "Python Notes", "Loops"), notes);

        let deep = "#### Loops\n\nBody";
        assert_eq!(strip_duplicate_titles(deep, "Python Notes", "Loops"), deep);
    }

    #[test]
    fn test_heading_variants() {
        assert_eq!(strip_duplicate_titles("###Loops  \r\n\r\nBody", "T", "Loops"), "Body");
        assert_eq!(strip_duplicate_titles("## Loops", "T", "Loops"), "");
    }

    #[test]
    fn test_special_characters_in_titles() {
        let notes = "# C++ (Part 1)\n\n## Pointers & *refs*\n\nBody";
        assert_eq!(
            strip_duplicate_titles(notes, "C++ (Part 1)", "Pointers & *refs*"),
            "Body"
        );
    }

    #[test]
    fn test_indentation_after_heading_is_trimmed() {
        let notes = "## Loops\n\n    indented";
        assert_eq!(strip_duplicate_titles(notes, "T", "Loops"), "indented");
    }
}
