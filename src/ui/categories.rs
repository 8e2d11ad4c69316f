use crossterm::style::{style, Color, Stylize};

use super::RenderOptions;
use crate::library::CategoryRegistry;
use crate::util::{display_width, truncate_to_width};

/// `name`, coloured by its registry colour label when colour is on and the
/// label is one crossterm knows (`red`, `dark_cyan`, ...).
pub fn paint_category(name: &str, registry: &CategoryRegistry, color: bool) -> String {
    let label = registry.get(name).and_then(|c| c.color.as_deref());
    match label.filter(|_| color).map(Color::try_from) {
        Some(Ok(c)) => style(name).with(c).to_string(),
        Some(Err(())) => {
            tracing::debug!(category = %name, label = ?label, "Unknown colour label");
            name.to_owned()
        }
        None => name.to_owned(),
    }
}

/// One line per category: name, feed count and colour label.
pub fn render_categories(registry: &CategoryRegistry, opts: &RenderOptions) -> String {
    if registry.is_empty() {
        return "No categories\n".to_owned();
    }

    let name_width = registry
        .iter()
        .map(|c| display_width(&c.name))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for category in registry.iter() {
        let pad = " ".repeat(name_width - display_width(&category.name));
        let feeds = if category.refcount == 1 { "feed" } else { "feeds" };
        let mut line = format!("{}{}  {} {}", category.name, pad, category.refcount, feeds);
        if let Some(label) = &category.color {
            line.push_str(&format!("  [{label}]"));
        }
        let line = truncate_to_width(&line, opts.width);
        // Colour is applied after truncation so escape codes never count as width
        let painted = line.replacen(
            category.name.as_str(),
            &paint_category(&category.name, registry, opts.color),
            1,
        );
        out.push_str(&painted);
        out.push('\n');
    }
    out
}
