//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::{DecryptedEntry, EntryMetadata};

/// Shown in place of a secret that failed to decrypt.
pub const UNREADABLE: &str = "<could not decrypt>";

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

fn star(favorite: bool) -> String {
    if favorite { "\u{2605}" } else { "" }.to_string()
}

fn print_empty_hint() {
    info("No entries in this vault yet.");
    tip("Run `keyseal add <SITE> <ACCOUNT>` to add your first entry.");
}

/// Print a table of entry metadata (no secrets).
pub fn print_entries_table(entries: &[EntryMetadata]) {
    if entries.is_empty() {
        print_empty_hint();
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Site", "Account", "Category", "\u{2605}", "Updated"]);

    for e in entries {
        table.add_row(vec![
            e.id.to_string(),
            e.site.clone(),
            e.account.clone(),
            e.category.clone(),
            star(e.favorite),
            e.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
}

/// Print a table of entries with their decrypted secrets.
///
/// Entries that failed to decrypt get a placeholder; the rest still print.
pub fn print_decrypted_table(entries: &[DecryptedEntry]) {
    if entries.is_empty() {
        print_empty_hint();
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Site", "Account", "Secret", "Category", "\u{2605}", "Notes"]);

    let mut failed = 0usize;
    for e in entries {
        let secret = match &e.secret {
            Ok(s) => s.as_str().to_string(),
            Err(_) => {
                failed += 1;
                style(UNREADABLE).red().to_string()
            }
        };
        let m = &e.metadata;
        table.add_row(vec![
            m.id.to_string(),
            m.site.clone(),
            m.account.clone(),
            secret,
            m.category.clone(),
            star(m.favorite),
            m.notes.clone().unwrap_or_default(),
        ]);
    }

    println!("{table}");
    if failed > 0 {
        warning(&format!("{failed} entr{} could not be decrypted", if failed == 1 { "y" } else { "ies" }));
    }
}
