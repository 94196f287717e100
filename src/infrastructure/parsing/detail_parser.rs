//! Parser for class-detail pages: the full ~28-field course record.
//!
//! The detail page is a fixed layout of label/value tables and header-led
//! sections. Required sections that are absent fail the unit; description,
//! notes and attributes are genuinely optional on the site.

use std::collections::BTreeSet;

use scraper::{ElementRef, Html, Selector};

use super::{ContextualParser, ParsingError, ParsingResult};
use crate::domain::course_detail::{detail_id, CourseDetail};

/// Context for one parsed detail page.
#[derive(Debug, Clone)]
pub struct DetailContext {
    pub term_code: String,
}

pub struct DetailParser {
    header: Selector,
    class_number: Selector,
    name_value_table: Selector,
    availability_table: Selector,
    // the site misspells this class name
    availability_indicator: Selector,
    span: Selector,
    detail_header: Selector,
    list_item: Selector,
    meeting_table: Selector,
    row: Selector,
    cell: Selector,
    div: Selector,
}

impl DetailParser {
    pub fn new() -> ParsingResult<Self> {
        Ok(Self {
            header: compile("h1")?,
            class_number: compile("div.classNumber")?,
            name_value_table: compile("table.nameValueTable")?,
            availability_table: compile("table.availabilityNameValueTable")?,
            availability_indicator: compile("div.availabiltyIndicator")?,
            span: compile("span")?,
            detail_header: compile("div.detailHeader")?,
            list_item: compile("div.listItem")?,
            meeting_table: compile("table.meetingPatternTable")?,
            row: compile("tr")?,
            cell: compile("td")?,
            div: compile("div")?,
        })
    }

    /// `h1` header: `"DEPT-CODE-SECTION: Course Title"`.
    fn parse_header(&self, html: &Html) -> ParsingResult<(String, String, String, String)> {
        let header = html
            .select(&self.header)
            .next()
            .ok_or_else(|| ParsingError::required_field_missing("h1", Some("course header")))?;
        let text = element_text(&header);

        let (code_part, title) = text
            .split_once(':')
            .ok_or_else(|| ParsingError::malformed("course header", format!("no ':' in '{text}'")))?;

        let mut parts = code_part.split('-').map(str::trim);
        let (dept, code, section) = match (parts.next(), parts.next(), parts.next()) {
            (Some(dept), Some(code), Some(section)) => (dept, code, section),
            _ => {
                return Err(ParsingError::malformed(
                    "course header",
                    format!("expected DEPT-CODE-SECTION in '{code_part}'"),
                ))
            }
        };

        Ok((
            dept.to_string(),
            code.to_string(),
            section.to_string(),
            title.trim().to_string(),
        ))
    }

    fn parse_class_number(&self, html: &Html) -> ParsingResult<String> {
        let element = html.select(&self.class_number).next().ok_or_else(|| {
            ParsingError::required_field_missing("div.classNumber", Some("class number"))
        })?;
        let text = element_text(&element);
        text.split_once(':')
            .map(|(_, number)| number.trim().to_string())
            .ok_or_else(|| ParsingError::malformed("class number", format!("no ':' in '{text}'")))
    }

    /// Value cell following the cell whose text equals `label` within
    /// `table`.
    fn label_value(&self, table: &ElementRef<'_>, label: &str) -> ParsingResult<String> {
        table
            .select(&self.cell)
            .find(|cell| element_text(cell) == label)
            .and_then(|cell| cell.next_siblings().find_map(ElementRef::wrap))
            .map(|value| element_text(&value))
            .ok_or_else(|| ParsingError::required_field_missing(label, Some("name/value table")))
    }

    /// Content `div` following the `div.detailHeader` whose text contains
    /// `title`. Absent headers are fine; these sections are optional.
    fn header_section<'a>(&self, html: &'a Html, title: &str) -> Option<ElementRef<'a>> {
        html.select(&self.detail_header)
            .find(|header| element_text(header).contains(title))
            .and_then(|header| header.next_siblings().find_map(ElementRef::wrap))
    }

    fn parse_availability(
        &self,
        html: &Html,
    ) -> ParsingResult<(String, String, String, String, String)> {
        let status = html
            .select(&self.availability_indicator)
            .next()
            .and_then(|indicator| indicator.select(&self.span).next())
            .map(|span| element_text(&span))
            .ok_or_else(|| {
                ParsingError::required_field_missing("availability indicator", Some("enrollment"))
            })?;

        let table = html.select(&self.availability_table).next().ok_or_else(|| {
            ParsingError::required_field_missing("availabilityNameValueTable", Some("enrollment"))
        })?;

        Ok((
            status,
            self.label_value(&table, "Class Capacity:")?,
            self.label_value(&table, "Total Enrolled:")?,
            self.label_value(&table, "Wait List Capacity:")?,
            self.label_value(&table, "Total on Wait List:")?,
        ))
    }

    /// Meeting pattern rows: parallel day/time/date sequences plus the
    /// deduplicated, rank-ordered instructor list.
    #[allow(clippy::type_complexity)]
    fn parse_meetings(
        &self,
        html: &Html,
    ) -> (Vec<String>, Vec<String>, Vec<String>, Vec<String>) {
        let mut days = Vec::new();
        let mut times = Vec::new();
        let mut dates = Vec::new();
        let mut names = BTreeSet::new();

        for table in html.select(&self.meeting_table) {
            for row in table.select(&self.row).skip(1) {
                let cells: Vec<ElementRef<'_>> = row.select(&self.cell).collect();
                if cells.len() < 5 {
                    continue; // probably bad data
                }
                days.push(element_text(&cells[0]));
                times.push(element_text(&cells[1]));
                dates.push(element_text(&cells[3]));
                for instructor in cells[4].select(&self.div) {
                    let name = element_text(&instructor);
                    if !name.is_empty() {
                        names.insert(name);
                    }
                }
            }
        }

        // Primary instructors first, then alphabetical by cleaned name;
        // everyone else is labelled secondary.
        let mut ranked: Vec<(bool, String)> = names
            .into_iter()
            .map(|name| {
                let is_primary = name.ends_with("(Primary)");
                let clean = name.replace("(Primary)", "").trim().to_string();
                (is_primary, clean)
            })
            .collect();
        ranked.sort_by(|a, b| (!a.0, &a.1).cmp(&(!b.0, &b.1)));

        let instructors = ranked
            .into_iter()
            .map(|(is_primary, name)| {
                if is_primary {
                    name
                } else {
                    format!("{name} (Secondary)")
                }
            })
            .collect();

        (days, times, dates, instructors)
    }
}

impl ContextualParser for DetailParser {
    type Output = CourseDetail;
    type Context = DetailContext;

    fn parse_with_context(
        &self,
        html: &Html,
        context: &Self::Context,
    ) -> ParsingResult<Self::Output> {
        let class_number = self.parse_class_number(html)?;
        let (course_dept, course_code, class_section, course_title) = self.parse_header(html)?;

        let details = html.select(&self.name_value_table).next().ok_or_else(|| {
            ParsingError::required_field_missing("nameValueTable", Some("course details"))
        })?;

        let term = self.label_value(&details, "Term:")?;
        let (term_year, term_season) = term.split_once(' ').ok_or_else(|| {
            ParsingError::malformed("term", format!("expected '<year> <season>', got '{term}'"))
        })?;

        let description = self
            .header_section(html, "Description")
            .map(|section| element_text(&section));
        let notes = self
            .header_section(html, "Notes")
            .map(|section| element_text(&section));
        let attributes = self.header_section(html, "Attributes").map(|section| {
            section
                .select(&self.list_item)
                .map(|item| element_text(&item))
                .collect::<Vec<_>>()
        });

        let (status, capacity, enrolled, wl_capacity, wl_occupied) =
            self.parse_availability(html)?;
        let (meeting_days, meeting_times, meeting_dates, instructors) = self.parse_meetings(html);

        Ok(CourseDetail {
            id: detail_id(&class_number, &context.term_code),
            course_dept,
            course_code,
            class_section,
            course_title,
            school: self.label_value(&details, "School:")?,
            career: self.label_value(&details, "Career:")?,
            class_type: self.label_value(&details, "Component:")?,
            credit_hours: self.label_value(&details, "Hours:")?,
            grading_basis: self.label_value(&details, "Grading Basis:")?,
            consent: self.label_value(&details, "Consent:")?,
            term_year: term_year.to_string(),
            term_season: term_season.to_string(),
            session: self.label_value(&details, "Session:")?,
            dates: self.label_value(&details, "Session Dates:")?,
            requirements: self.label_value(&details, "Requirement(s):")?,
            description,
            notes,
            status,
            capacity,
            enrolled,
            wl_capacity,
            wl_occupied,
            attributes,
            meeting_days,
            meeting_times,
            meeting_dates,
            instructors,
        })
    }
}

fn compile(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|_| ParsingError::InvalidSelector {
        selector: selector.to_string(),
    })
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
