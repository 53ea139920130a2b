//! Raw dump records -> uniform `Document`s.
//!
//! Primary dumps (catalog, employee directory) are normalized first. Auxiliary
//! search-index dumps then either enrich an existing document's `keywords`
//! field or contribute standalone documents of the same entity type.

use crate::dumps::LoadedDumps;
use crate::error::MalformedInput;
use crate::{Document, EntityType};
use serde_json::{Map, Value};
use std::collections::HashMap;

const COURSES: &str = "courses";
const COURSE_INDEX: &str = "course index";
const EMPLOYEES: &str = "employees";
const EMPLOYEE_INDEX: &str = "employee index";

#[derive(Debug, Default)]
pub struct Normalized {
    pub documents: Vec<Document>,
    pub skipped: Vec<MalformedInput>,
}

pub fn normalize(dumps: &LoadedDumps) -> Normalized {
    let mut n = Normalizer::default();
    if let Some(v) = &dumps.courses {
        n.catalog(v);
    }
    if let Some(v) = &dumps.employees {
        n.employees(v);
    }
    if let Some(v) = &dumps.course_index {
        n.auxiliary(v, EntityType::Course);
    }
    if let Some(v) = &dumps.employee_index {
        n.auxiliary(v, EntityType::Employee);
    }
    n.finish()
}

#[derive(Default)]
struct Normalizer {
    docs: Vec<Document>,
    ids: HashMap<String, usize>,
    skipped: Vec<MalformedInput>,
}

impl Normalizer {
    /// `{ institution: { term: [course, ...] } }`
    fn catalog(&mut self, root: &Value) {
        let Some(institutions) = self.root_object(root, COURSES) else { return };
        for (inst, terms) in institutions {
            let Some(terms) = self.object_or_skip(terms, COURSES, inst) else { continue };
            for (term, courses) in terms {
                match entries(courses) {
                    Some(list) => {
                        for (key, raw) in list {
                            self.course(inst, term, &key, raw);
                        }
                    }
                    None => self.skip(MalformedInput::NotAnObject { source_name: COURSES, key: format!("{inst}/{term}") }),
                }
            }
        }
    }

    fn course(&mut self, inst: &str, term: &str, key: &str, raw: &Value) {
        let location = format!("{inst}/{term}/{key}");
        let Some(obj) = self.object_or_skip(raw, COURSES, &location) else { return };
        let Some(subject) = text_of(obj.get("subject")) else {
            return self.skip(MalformedInput::MissingField { source_name: COURSES, key: location, field: "subject" });
        };
        let Some(number) = text_of(obj.get("number")) else {
            return self.skip(MalformedInput::MissingField { source_name: COURSES, key: location, field: "number" });
        };

        let course_id = format!("course:{inst}:{term}:{subject}-{number}");
        let title = text_of(obj.get("title"));
        let fields = course_fields(obj);
        self.push(Document {
            id: course_id.clone(),
            entity_type: EntityType::Course,
            fields,
            parent: None,
            payload: raw.clone(),
        });

        for (key, raw) in obj.get("sections").and_then(entries).unwrap_or_default() {
            let location = format!("{course_id}/{key}");
            let Some(obj) = self.object_or_skip(raw, COURSES, &location) else { continue };
            let Some(section) = text_of(obj.get("section")) else {
                self.skip(MalformedInput::MissingField { source_name: COURSES, key: location, field: "section" });
                continue;
            };
            let mut fields = Vec::new();
            add_field(&mut fields, "code", Some(section.clone()));
            add_field(&mut fields, "instructor", first_text(obj, &["instructor", "instructors"]));
            add_field(&mut fields, "location", text_of(obj.get("location")));
            add_field(&mut fields, "title", title.clone());
            self.push(Document {
                id: format!("section:{inst}:{term}:{subject}-{number}:{section}"),
                entity_type: EntityType::Section,
                fields,
                parent: Some(course_id.clone()),
                payload: raw.clone(),
            });
        }
    }

    /// `{ key: { name, title, department, email } }`
    fn employees(&mut self, root: &Value) {
        let Some(map) = self.root_object(root, EMPLOYEES) else { return };
        for (key, raw) in map {
            self.employee(EMPLOYEES, key, raw);
        }
    }

    fn employee(&mut self, source_name: &'static str, key: &str, raw: &Value) {
        let Some(obj) = self.object_or_skip(raw, source_name, key) else { return };
        if key.trim().is_empty() {
            return self.skip(MalformedInput::MissingField { source_name, key: key.to_string(), field: "key" });
        }
        if text_of(obj.get("name")).is_none() {
            return self.skip(MalformedInput::MissingField { source_name, key: key.to_string(), field: "name" });
        }
        let mut fields = Vec::new();
        for field in ["name", "title", "department", "email"] {
            add_field(&mut fields, field, text_of(obj.get(field)));
        }
        self.push(Document {
            id: format!("employee:{key}"),
            entity_type: EntityType::Employee,
            fields,
            parent: None,
            payload: raw.clone(),
        });
    }

    fn auxiliary(&mut self, root: &Value, kind: EntityType) {
        let (source_name, prefix) = match kind {
            EntityType::Employee => (EMPLOYEE_INDEX, "employee"),
            _ => (COURSE_INDEX, "course"),
        };
        let Some(map) = self.root_object(root, source_name) else { return };
        for (key, raw) in map {
            if self.object_or_skip(raw, source_name, key).is_none() {
                continue;
            }
            let id = format!("{prefix}:{key}");
            if let Some(&slot) = self.ids.get(&id) {
                // Enrich the primary record; its payload stays authoritative.
                if let Some(extra) = text_of(Some(raw)) {
                    append_keywords(&mut self.docs[slot], extra);
                }
                continue;
            }
            match kind {
                EntityType::Employee => self.employee(source_name, key, raw),
                _ => self.aux_course(key, id, raw),
            }
        }
    }

    fn aux_course(&mut self, key: &str, id: String, raw: &Value) {
        let Some(obj) = self.object_or_skip(raw, COURSE_INDEX, key) else { return };
        if text_of(obj.get("title")).is_none() {
            return self.skip(MalformedInput::MissingField { source_name: COURSE_INDEX, key: key.to_string(), field: "title" });
        }
        self.push(Document {
            id,
            entity_type: EntityType::Course,
            fields: course_fields(obj),
            parent: None,
            payload: raw.clone(),
        });
    }

    /// Insert unless the id is taken or there is nothing to search.
    fn push(&mut self, doc: Document) {
        if doc.fields.is_empty() {
            let source_name = match doc.entity_type {
                EntityType::Employee => EMPLOYEES,
                _ => COURSES,
            };
            return self.skip(MalformedInput::NoText { source_name, key: doc.id });
        }
        if self.ids.contains_key(&doc.id) {
            return self.skip(MalformedInput::DuplicateId(doc.id));
        }
        self.ids.insert(doc.id.clone(), self.docs.len());
        self.docs.push(doc);
    }

    /// A dump root; `null` is an empty dump file and contributes nothing.
    fn root_object<'v>(&mut self, v: &'v Value, source_name: &'static str) -> Option<&'v Map<String, Value>> {
        if v.is_null() {
            return None;
        }
        self.object_or_skip(v, source_name, "<root>")
    }

    fn object_or_skip<'v>(&mut self, v: &'v Value, source_name: &'static str, key: &str) -> Option<&'v Map<String, Value>> {
        let obj = v.as_object();
        if obj.is_none() {
            self.skip(MalformedInput::NotAnObject { source_name, key: key.to_string() });
        }
        obj
    }

    fn skip(&mut self, err: MalformedInput) {
        tracing::debug!(error = %err, "skipping record");
        self.skipped.push(err);
    }

    fn finish(self) -> Normalized {
        if !self.skipped.is_empty() {
            tracing::warn!(skipped = self.skipped.len(), kept = self.docs.len(), "malformed dump records skipped");
        }
        Normalized { documents: self.docs, skipped: self.skipped }
    }
}

fn course_fields(obj: &Map<String, Value>) -> Vec<(String, String)> {
    let subject = text_of(obj.get("subject"));
    let number = text_of(obj.get("number"));
    let mut fields = Vec::new();
    if let (Some(s), Some(n)) = (&subject, &number) {
        add_field(&mut fields, "code", Some(format!("{s}{n}")));
    }
    add_field(&mut fields, "subject", subject);
    add_field(&mut fields, "number", number);
    add_field(&mut fields, "title", text_of(obj.get("title")));
    add_field(&mut fields, "description", text_of(obj.get("description")));
    fields
}

fn append_keywords(doc: &mut Document, extra: String) {
    match doc.fields.iter_mut().find(|(n, _)| n == "keywords") {
        Some((_, text)) => {
            text.push(' ');
            text.push_str(&extra);
        }
        None => doc.fields.push(("keywords".to_string(), extra)),
    }
}

fn add_field(fields: &mut Vec<(String, String)>, name: &str, text: Option<String>) {
    if let Some(text) = text {
        fields.push((name.to_string(), text));
    }
}

fn first_text(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|n| text_of(obj.get(*n)))
}

/// Flatten a JSON value to searchable text. Strings and numbers as-is,
/// arrays and objects by joining their members. Blank results are `None`.
fn text_of(v: Option<&Value>) -> Option<String> {
    let text = match v? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().filter_map(|i| text_of(Some(i))).collect::<Vec<_>>().join(" "),
        Value::Object(map) => map.values().filter_map(|i| text_of(Some(i))).collect::<Vec<_>>().join(" "),
        Value::Bool(_) | Value::Null => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Keyed members of an array (index as key) or object.
fn entries(v: &Value) -> Option<Vec<(String, &Value)>> {
    match v {
        Value::Array(items) => Some(items.iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect()),
        Value::Object(map) => Some(map.iter().map(|(k, v)| (k.clone(), v)).collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dumps(courses: Value, employees: Value) -> LoadedDumps {
        LoadedDumps { courses: Some(courses), employees: Some(employees), ..Default::default() }
    }

    #[test]
    fn sections_are_separate_documents_with_parent() {
        let out = normalize(&dumps(
            json!({"CMU": {"F24": [{
                "subject": "15", "number": "122", "title": "Principles of Imperative Computation",
                "sections": [{"section": "A", "instructor": ["Iliano Cervesato"]}, {"instructor": "nobody"}]
            }]}}),
            Value::Null,
        ));
        let ids: Vec<&str> = out.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["course:CMU:F24:15-122", "section:CMU:F24:15-122:A"]);

        let section = &out.documents[1];
        assert_eq!(section.entity_type, EntityType::Section);
        assert_eq!(section.parent.as_deref(), Some("course:CMU:F24:15-122"));
        assert_eq!(section.field("instructor"), Some("Iliano Cervesato"));
        assert_eq!(section.field("title"), Some("Principles of Imperative Computation"));
        assert_eq!(out.documents[0].field("code"), Some("15122"));
        assert!(out.documents[0].payload["sections"].is_array());

        assert_eq!(out.skipped.len(), 1);
        assert!(matches!(out.skipped[0], MalformedInput::MissingField { field: "section", .. }));
    }

    #[test]
    fn malformed_records_are_counted_not_fatal() {
        let out = normalize(&dumps(
            json!({"CMU": {"F24": [{"title": "No code"}, 7, {"subject": "CS", "number": 101}]}}),
            json!({"jdoe": {"name": "Jane Doe"}, "ghost": {"department": "CS"}, "  ": {"name": "Blank"}}),
        ));
        assert_eq!(out.documents.len(), 2);
        assert_eq!(out.skipped.len(), 4);
        assert!(out.documents.iter().all(|d| !d.fields.is_empty()));
    }

    #[test]
    fn null_entries_are_malformed() {
        let out = normalize(&dumps(
            json!({"CMU": {"F24": [null, {"subject": "CS", "number": "101", "title": "Intro", "sections": [null]}]}, "PITT": null}),
            json!({"jdoe": null, "asmith": {"name": "Alex"}}),
        ));
        let ids: Vec<&str> = out.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["course:CMU:F24:CS-101", "employee:asmith"]);
        assert_eq!(out.skipped.len(), 4);
        assert!(out.skipped.iter().all(|e| matches!(e, MalformedInput::NotAnObject { .. })));
    }

    #[test]
    fn non_object_auxiliary_entries_are_malformed() {
        let mut d = dumps(Value::Null, json!({"jdoe": {"name": "Jane Doe"}}));
        d.employee_index = Some(json!({"jdoe": "alias", "ghost": null, "asmith": {"name": "Alex Smith"}}));
        d.course_index = Some(json!({"CMU:F24:CS-999": [1, 2]}));
        let out = normalize(&d);

        assert_eq!(out.documents.len(), 2);
        assert_eq!(out.documents[0].field("keywords"), None);
        assert_eq!(out.skipped.len(), 3);
        assert!(out.skipped.iter().all(|e| matches!(e, MalformedInput::NotAnObject { .. })));
    }

    #[test]
    fn empty_dump_roots_contribute_nothing() {
        let out = normalize(&dumps(Value::Null, Value::Null));
        assert!(out.documents.is_empty());
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let out = normalize(&dumps(
            json!({"CMU": {"F24": [
                {"subject": "CS", "number": "101", "title": "First"},
                {"subject": "CS", "number": "101", "title": "Second"}
            ]}}),
            Value::Null,
        ));
        assert_eq!(out.documents.len(), 1);
        assert_eq!(out.documents[0].field("title"), Some("First"));
        assert_eq!(out.skipped, vec![MalformedInput::DuplicateId("course:CMU:F24:CS-101".into())]);
    }

    #[test]
    fn auxiliary_dumps_enrich_or_add() {
        let mut d = dumps(json!(null), json!({"jdoe": {"name": "Jane Doe", "department": "CS"}}));
        d.employee_index = Some(json!({
            "jdoe": {"aliases": ["JD", "janie"]},
            "asmith": {"name": "Alex Smith"},
            "nameless": {"department": "Physics"}
        }));
        d.course_index = Some(json!({"CMU:F24:CS-999": {"title": "Topics"}}));
        let out = normalize(&d);

        let jane = out.documents.iter().find(|d| d.id == "employee:jdoe").unwrap();
        assert_eq!(jane.field("keywords"), Some("JD janie"));
        assert_eq!(jane.payload, json!({"name": "Jane Doe", "department": "CS"}));
        assert!(out.documents.iter().any(|d| d.id == "employee:asmith"));
        assert!(out.documents.iter().any(|d| d.id == "course:CMU:F24:CS-999"));
        assert_eq!(out.skipped.len(), 1);
    }
}
