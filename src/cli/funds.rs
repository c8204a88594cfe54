use super::ui;
use crate::core::fund::FundCatalog;
use comfy_table::Cell;

/// Prints the selectable funds, optionally narrowed by `filter`.
pub fn run(catalog: &FundCatalog, filter: Option<&str>) {
    print!("{}", render(catalog, filter));
}

pub fn render(catalog: &FundCatalog, filter: Option<&str>) -> String {
    let options = match filter {
        Some(filter) => catalog.search(filter),
        None => catalog.options(),
    };
    if options.is_empty() {
        return format!(
            "{}\n",
            ui::style_text("No funds match the given filter.", ui::StyleType::Subtle)
        );
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Commercial Name"),
        ui::header_cell("Tax ID"),
    ]);
    for option in &options {
        table.add_row(vec![
            Cell::new(&option.commercial_name),
            Cell::new(&option.tax_id),
        ]);
    }
    format!(
        "{table}\n{}\n",
        ui::style_text(&format!("{} funds", options.len()), ui::StyleType::Subtle)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fund::FundReference;

    fn catalog() -> FundCatalog {
        FundCatalog::new(vec![
            FundReference {
                commercial_name: "Zeta Multimercado".to_string(),
                tax_id: "11.111.111/0001-11".to_string(),
            },
            FundReference {
                commercial_name: "Alpha Ações".to_string(),
                tax_id: "22.222.222/0001-22".to_string(),
            },
        ])
    }

    #[test]
    fn test_lists_sorted_funds() {
        let output = render(&catalog(), None);
        let alpha = output.find("Alpha Ações").unwrap();
        let zeta = output.find("Zeta Multimercado").unwrap();
        assert!(alpha < zeta);
        assert!(output.contains("2 funds"));
    }

    #[test]
    fn test_filter() {
        let output = render(&catalog(), Some("zeta"));
        assert!(output.contains("Zeta Multimercado"));
        assert!(!output.contains("Alpha Ações"));

        let output = render(&catalog(), Some("nothing"));
        assert!(output.contains("No funds match"));
    }
}
