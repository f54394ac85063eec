use crate::error::{Result, ScanError};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::path::Path;

/// One row of the rendered report, in scanner document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub address: String,
    pub description: String,
    pub identifier: String,
}

enum TextField {
    Description,
    Identifier,
}

#[derive(Default)]
struct PartialFinding {
    description: String,
    identifier: String,
}

/// Extract findings from a structured scanner report.
///
/// Every `item` element becomes one finding, tagged with the `targetip`
/// attribute of its enclosing `scandetails` element. Missing attributes
/// or text yield empty fields; anything the XML parser rejects fails
/// the whole extraction.
pub fn parse_findings(xml: &str) -> Result<Vec<Finding>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut findings = Vec::new();
    let mut address = String::new();
    let mut item: Option<PartialFinding> = None;
    let mut text_field: Option<TextField> = None;

    loop {
        match reader.read_event() {
            Err(e) => return Err(ScanError::ReportParse(e.to_string())),
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"scandetails" => address = target_address(&e)?,
                b"item" => item = Some(PartialFinding::default()),
                b"description" if item.is_some() => text_field = Some(TextField::Description),
                b"osvdbid" if item.is_some() => text_field = Some(TextField::Identifier),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"scandetails" => address = target_address(&e)?,
                b"item" => findings.push(Finding {
                    address: address.clone(),
                    description: String::new(),
                    identifier: String::new(),
                }),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let (Some(partial), Some(field)) = (item.as_mut(), text_field.as_ref()) {
                    let text = t
                        .unescape()
                        .map_err(|e| ScanError::ReportParse(e.to_string()))?;
                    match field {
                        TextField::Description => partial.description.push_str(&text),
                        TextField::Identifier => partial.identifier.push_str(&text),
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if let (Some(partial), Some(field)) = (item.as_mut(), text_field.as_ref()) {
                    let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                    match field {
                        TextField::Description => partial.description.push_str(&text),
                        TextField::Identifier => partial.identifier.push_str(&text),
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"scandetails" => address.clear(),
                b"item" => {
                    if let Some(partial) = item.take() {
                        findings.push(Finding {
                            address: address.clone(),
                            description: partial.description,
                            identifier: partial.identifier,
                        });
                    }
                }
                b"description" | b"osvdbid" => text_field = None,
                _ => {}
            },
            Ok(_) => {}
        }
    }

    Ok(findings)
}

fn target_address(element: &quick_xml::events::BytesStart<'_>) -> Result<String> {
    match element
        .try_get_attribute("targetip")
        .map_err(|e| ScanError::ReportParse(e.to_string()))?
    {
        Some(attr) => Ok(attr
            .unescape_value()
            .map_err(|e| ScanError::ReportParse(e.to_string()))?
            .into_owned()),
        None => Ok(String::new()),
    }
}

/// Render findings as an HTML table document.
///
/// Header row plus one row per finding, so a report with N findings
/// renders N+1 table rows. Output is fully deterministic for a given
/// input.
pub fn render_table(findings: &[Finding]) -> String {
    let mut html = String::with_capacity(256 + findings.len() * 128);
    html.push_str("<html><head><title>Scan Report</title></head><body>\n");
    html.push_str("<h1>Scan Report</h1>\n");
    html.push_str("<table border=\"1\" cellspacing=\"0\" cellpadding=\"5\">\n");
    html.push_str("<tr><th>Address</th><th>Finding</th><th>Identifier</th></tr>\n");
    for finding in findings {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&finding.address),
            html_escape(&finding.description),
            html_escape(&finding.identifier),
        ));
    }
    html.push_str("</table>\n</body></html>\n");
    html
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Transform a structured report file into a rendered report file.
///
/// The output is rendered fully in memory before anything is written,
/// so a missing or malformed input produces no output file at all.
pub fn render_report(xml_path: &Path, html_path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(xml_path)?;
    let findings = parse_findings(&raw)?;
    let html = render_table(&findings);
    std::fs::write(html_path, html)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE_REPORT: &str = r#"<?xml version="1.0" ?>
<niktoscan>
  <scandetails targetip="192.168.1.10" targethostname="example.com">
    <item id="1">
      <description>Server leaks inode information via ETags</description>
      <osvdbid>3233</osvdbid>
    </item>
    <item id="2">
      <description>The X-Content-Type-Options header is not set</description>
      <osvdbid>0</osvdbid>
    </item>
  </scandetails>
  <scandetails targetip="192.168.1.11">
    <item id="3">
      <description>Directory indexing found</description>
      <osvdbid>3268</osvdbid>
    </item>
  </scandetails>
</niktoscan>
"#;

    fn row_count(html: &str) -> usize {
        html.matches("<tr>").count()
    }

    #[test]
    fn extracts_one_finding_per_item_in_document_order() {
        let findings = parse_findings(SAMPLE_REPORT).unwrap();
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].address, "192.168.1.10");
        assert_eq!(findings[0].identifier, "3233");
        assert_eq!(findings[1].address, "192.168.1.10");
        assert_eq!(findings[2].address, "192.168.1.11");
        assert_eq!(findings[2].description, "Directory indexing found");
    }

    #[test]
    fn renders_header_plus_one_row_per_finding() {
        let findings = parse_findings(SAMPLE_REPORT).unwrap();
        let html = render_table(&findings);
        assert_eq!(row_count(&html), findings.len() + 1);
        assert!(html.contains("<th>Address</th><th>Finding</th><th>Identifier</th>"));
    }

    #[test]
    fn empty_report_renders_header_row_only() {
        let findings = parse_findings("<niktoscan></niktoscan>").unwrap();
        assert!(findings.is_empty());
        assert_eq!(row_count(&render_table(&findings)), 1);
    }

    #[test]
    fn missing_fields_render_as_empty_cells() {
        let xml = r#"<niktoscan><scandetails><item><description></description></item><item/></scandetails></niktoscan>"#;
        let findings = parse_findings(xml).unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].address, "");
        assert_eq!(findings[0].identifier, "");

        let html = render_table(&findings);
        assert!(html.contains("<tr><td></td><td></td><td></td></tr>"));
    }

    #[test]
    fn items_after_scandetails_close_get_no_stale_address() {
        let xml = r#"<root><scandetails targetip="10.0.0.1"><item><description>a</description></item></scandetails><item><description>b</description></item></root>"#;
        let findings = parse_findings(xml).unwrap();
        assert_eq!(findings[0].address, "10.0.0.1");
        assert_eq!(findings[1].address, "");
    }

    #[test]
    fn xml_entities_are_unescaped_then_html_escaped() {
        let xml = r#"<niktoscan><scandetails targetip="h"><item><description>GET &amp; POST &lt;ok&gt;</description><osvdbid>1</osvdbid></item></scandetails></niktoscan>"#;
        let findings = parse_findings(xml).unwrap();
        assert_eq!(findings[0].description, "GET & POST <ok>");

        let html = render_table(&findings);
        assert!(html.contains("<td>GET &amp; POST &lt;ok&gt;</td>"));
    }

    #[test]
    fn markup_in_cdata_descriptions_is_escaped_in_output() {
        let xml = r#"<niktoscan><scandetails targetip="h"><item><description><![CDATA[<script>alert(1)</script>]]></description></item></scandetails></niktoscan>"#;
        let findings = parse_findings(xml).unwrap();
        let html = render_table(&findings);
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn rendering_is_idempotent_for_a_fixed_input() {
        let findings = parse_findings(SAMPLE_REPORT).unwrap();
        assert_eq!(render_table(&findings), render_table(&findings));
    }

    #[test]
    fn malformed_report_fails_extraction() {
        assert!(parse_findings("<niktoscan><scandetails></wrong></niktoscan>").is_err());
        assert!(parse_findings("not xml at all <<<").is_err());
    }

    #[test]
    fn render_report_writes_rendered_file_for_valid_input() {
        let dir = TempDir::new().unwrap();
        let xml_path = dir.path().join("scan.xml");
        let html_path = dir.path().join("report.html");
        std::fs::write(&xml_path, SAMPLE_REPORT).unwrap();

        render_report(&xml_path, &html_path).unwrap();

        let html = std::fs::read_to_string(&html_path).unwrap();
        assert_eq!(row_count(&html), 4);
    }

    #[test]
    fn render_report_leaves_no_file_for_malformed_input() {
        let dir = TempDir::new().unwrap();
        let xml_path = dir.path().join("scan.xml");
        let html_path = dir.path().join("report.html");
        std::fs::write(&xml_path, "<niktoscan></wrong>").unwrap();

        assert!(render_report(&xml_path, &html_path).is_err());
        assert!(!html_path.exists());
    }

    #[test]
    fn render_report_leaves_no_file_for_missing_input() {
        let dir = TempDir::new().unwrap();
        let xml_path = dir.path().join("absent.xml");
        let html_path = dir.path().join("report.html");

        assert!(render_report(&xml_path, &html_path).is_err());
        assert!(!html_path.exists());
    }
}
