//! Tabs of the episode detail view and the data each one reads.

/// Independent views over one episode. Switching tabs never refetches data
/// another tab already loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EpisodeTab {
    #[default]
    Overview,
    Scenes,
    Script,
    Video,
    PipelineLog,
}

/// A read an episode tab depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabData {
    Episode,
    Scenes,
    PipelineLog,
}

impl EpisodeTab {
    pub const ALL: [EpisodeTab; 5] = [
        EpisodeTab::Overview,
        EpisodeTab::Scenes,
        EpisodeTab::Script,
        EpisodeTab::Video,
        EpisodeTab::PipelineLog,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EpisodeTab::Overview => "Overview",
            EpisodeTab::Scenes => "Scenes",
            EpisodeTab::Script => "Script",
            EpisodeTab::Video => "Video",
            EpisodeTab::PipelineLog => "Pipeline Log",
        }
    }

    /// Parse the `?tab=` value used in links.
    pub fn from_slug(slug: &str) -> Option<EpisodeTab> {
        match slug {
            "overview" => Some(EpisodeTab::Overview),
            "scenes" => Some(EpisodeTab::Scenes),
            "script" => Some(EpisodeTab::Script),
            "video" => Some(EpisodeTab::Video),
            "logs" | "pipeline-log" => Some(EpisodeTab::PipelineLog),
            _ => None,
        }
    }

    pub fn data(self) -> &'static [TabData] {
        match self {
            EpisodeTab::Overview | EpisodeTab::Script | EpisodeTab::Video => &[TabData::Episode],
            EpisodeTab::Scenes => &[TabData::Episode, TabData::Scenes],
            EpisodeTab::PipelineLog => &[TabData::PipelineLog],
        }
    }
}
