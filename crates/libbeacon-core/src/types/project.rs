use serde::{Deserialize, Serialize};

/// One entry of the project index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectEntry {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stp_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ai_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub prompt_pack_url: String,
    pub tags: Vec<String>,
}

impl ProjectEntry {
    /// Case-insensitive match on name, id or any tag
    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&q)
            || self.id.to_lowercase().contains(&q)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&q))
    }

    /// Base URL the project's artifacts are served from, derived from its
    /// snapshot URL (`https://host/stp.json` -> `https://host`)
    pub fn base_url(&self) -> Option<String> {
        let url = self.stp_url.trim();
        if url.is_empty() {
            return None;
        }
        let without_query = url.split(['?', '#']).next().unwrap_or(url);
        let base = match without_query.rfind('/') {
            Some(idx) if !without_query[..idx].ends_with('/') && idx > 0 => &without_query[..idx],
            _ => without_query,
        };
        Some(base.trim_end_matches('/').to_string())
    }
}

/// Filter projects by query, keeping index order
pub fn filter_projects<'a>(projects: &'a [ProjectEntry], query: &str) -> Vec<&'a ProjectEntry> {
    projects.iter().filter(|p| p.matches(query)).collect()
}

/// Parse a comma-separated tag list, dropping blanks
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projects() -> Vec<ProjectEntry> {
        vec![
            ProjectEntry {
                id: "griffin-map-quiz".into(),
                name: "Griffin Map Quiz".into(),
                tags: vec!["map".into(), "training".into()],
                ..Default::default()
            },
            ProjectEntry {
                id: "brain".into(),
                name: "Project Brain Beacon".into(),
                tags: vec!["meta".into()],
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_filter_by_name_id_and_tag() {
        let all = projects();
        assert_eq!(filter_projects(&all, "").len(), 2);
        assert_eq!(filter_projects(&all, "  BEACON ")[0].id, "brain");
        assert_eq!(filter_projects(&all, "griffin-map")[0].id, "griffin-map-quiz");
        assert_eq!(filter_projects(&all, "train")[0].id, "griffin-map-quiz");
        assert!(filter_projects(&all, "nothing").is_empty());
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags("map, quiz,, training ,"), vec!["map", "quiz", "training"]);
        assert!(parse_tags("  ").is_empty());
    }

    #[test]
    fn test_base_url_from_stp_url() {
        let mut p = ProjectEntry {
            stp_url: "https://beacon.example.com/stp.json?x=1".into(),
            ..Default::default()
        };
        assert_eq!(p.base_url().as_deref(), Some("https://beacon.example.com"));

        p.stp_url = "https://beacon.example.com".into();
        assert_eq!(p.base_url().as_deref(), Some("https://beacon.example.com"));

        p.stp_url = String::new();
        assert!(p.base_url().is_none());
    }
}
