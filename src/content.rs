//! Read-only content shown in the detail overlay, keyed by id.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Block {
    Heading(String),
    Paragraph(String),
}

/// Where an entry is reachable from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    #[default]
    Bubble,
    Hud,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub body: Vec<Block>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Short text drawn on the bubble or HUD block; defaults to the title.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub placement: Placement,
}

impl Entry {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.title)
    }

    pub fn byline(&self) -> String {
        format!("{} | {}", self.subtitle, self.date)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentMap {
    entries: BTreeMap<String, Entry>,
}

impl ContentMap {
    pub fn load(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("could not read content file {}", path.display()))?;
        let map: ContentMap = serde_json::from_str(&s)
            .with_context(|| format!("could not parse content file {}", path.display()))?;
        log::info!("loaded {} content entries from {}", map.len(), path.display());
        Ok(map)
    }

    pub fn insert(&mut self, id: impl Into<String>, entry: Entry) {
        self.entries.insert(id.into(), entry);
    }

    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with the given placement, in id order.
    pub fn placed(&self, placement: Placement) -> impl Iterator<Item = (&str, &Entry)> + '_ {
        self.entries
            .iter()
            .filter(move |(_, e)| e.placement == placement)
            .map(|(k, e)| (k.as_str(), e))
    }

    pub fn builtin() -> Self {
        let mut map = Self::default();
        let p = |s: &str| Block::Paragraph(s.to_string());
        let h = |s: &str| Block::Heading(s.to_string());
        fn tags(t: &[&str]) -> Vec<String> {
            t.iter().map(|s| s.to_string()).collect()
        }

        map.insert(
            "lab",
            Entry {
                title: "Thin Film Lab".into(),
                subtitle: "Process Engineer".into(),
                date: "2024 - Present".into(),
                body: vec![
                    p("Tuned sputter deposition recipes with a fractional-factorial DOE."),
                    p("Characterized patterned films by SEM and optical profilometry."),
                ],
                tags: tags(&["Sputtering", "SEM", "Photolithography", "DOE"]),
                label: Some("Lab".into()),
                placement: Placement::Bubble,
            },
        );
        map.insert(
            "internship",
            Entry {
                title: "Materials Data Internship".into(),
                subtitle: "Data Engineering Intern".into(),
                date: "Summer 2024".into(),
                body: vec![
                    p("Built a pipeline moving material records into a graph database."),
                    p("Cut lookup time for property searches by reformatting the data model."),
                ],
                tags: tags(&["Python", "Graph Databases", "ETL"]),
                label: Some("Internship".into()),
                placement: Placement::Bubble,
            },
        );
        map.insert(
            "research",
            Entry {
                title: "Polymer Research Group".into(),
                subtitle: "Undergraduate Researcher".into(),
                date: "2023 - 2024".into(),
                body: vec![
                    p("Designed and laser-cut a multi-channel desiccant wheel."),
                    p("Measured water uptake by gravimetric sorption analysis."),
                ],
                tags: tags(&["CAD", "Laser Cutting", "Polymer Synthesis"]),
                label: Some("Research".into()),
                placement: Placement::Bubble,
            },
        );
        map.insert(
            "outreach",
            Entry {
                title: "Science Outreach".into(),
                subtitle: "Event Organizer".into(),
                date: "2023 - Present".into(),
                body: vec![
                    p("Ran a materials science event for over a hundred participants."),
                    p("Wrote the exam question bank and trained the volunteer graders."),
                ],
                tags: tags(&["Education", "Event Management"]),
                label: Some("Outreach".into()),
                placement: Placement::Bubble,
            },
        );
        map.insert(
            "skills",
            Entry {
                title: "Technical Skills".into(),
                subtitle: "Instrumentation & Computation".into(),
                date: "Core Competencies".into(),
                body: vec![
                    h("Fabrication"),
                    p("PVD (sputtering, e-beam), optical lithography, hydrogel synthesis."),
                    h("Characterization"),
                    p("Scanning electron microscopy, thermal analysis."),
                    h("Computation"),
                    p("CAD, Python, finite element analysis."),
                ],
                tags: tags(&["Metrology", "Nanofabrication", "Simulation"]),
                label: Some("Skills".into()),
                placement: Placement::Hud,
            },
        );
        map.insert(
            "education",
            Entry {
                title: "University".into(),
                subtitle: "B.S.E. Materials Science and Engineering".into(),
                date: "2027".into(),
                body: vec![p(
                    "Coursework in failure analysis, solid state physics and quantum mechanics of materials.",
                )],
                tags: tags(&["Materials Science", "Engineering"]),
                label: Some("Education".into()),
                placement: Placement::Hud,
            },
        );
        map
    }
}

/// Greedy word wrap to `width` columns. Words longer than a line are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let extra = if line.is_empty() { 0 } else { 1 };
        if line.chars().count() + extra + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.extend(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
