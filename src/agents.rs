use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mood component of an agent's adaptive personality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalState {
    Neutral,
    Inspired,
    Tired,
    Angry,
    Mystical,
    Analytical,
}

impl EmotionalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionalState::Neutral => "neutral",
            EmotionalState::Inspired => "inspired",
            EmotionalState::Tired => "tired",
            EmotionalState::Angry => "angry",
            EmotionalState::Mystical => "mystical",
            EmotionalState::Analytical => "analytical",
        }
    }
}

/// Mutable personality state, owned by the federation and touched only by
/// personality evolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptivePersonality {
    pub tone: String,
    pub emotional_state: EmotionalState,
    pub drift_vector: Vec<String>,
    pub last_interaction_quality: f64,
    pub energy_level: i64,
    pub wisdom_accumulation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentKind {
    MysticSage,
    ArabAnalyst,
    CodeMaster,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::MysticSage => "mystic-sage",
            AgentKind::ArabAnalyst => "arab-analyst",
            AgentKind::CodeMaster => "code-master",
        }
    }

    pub fn from_str(s: &str) -> Option<AgentKind> {
        match s {
            "mystic-sage" => Some(AgentKind::MysticSage),
            "arab-analyst" => Some(AgentKind::ArabAnalyst),
            "code-master" => Some(AgentKind::CodeMaster),
            _ => None,
        }
    }

    /// Registry seed order. The fallback coalition path iterates in this
    /// order, so it is part of the observable behavior.
    pub fn all() -> [AgentKind; 3] {
        [AgentKind::MysticSage, AgentKind::ArabAnalyst, AgentKind::CodeMaster]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentKind::MysticSage => "الحكيم الصوفي",
            AgentKind::ArabAnalyst => "المحلل العربي",
            AgentKind::CodeMaster => "سيد الأكواد",
        }
    }

    pub fn avatar(&self) -> &'static str {
        match self {
            AgentKind::MysticSage => "🧙‍♂️",
            AgentKind::ArabAnalyst => "📊",
            AgentKind::CodeMaster => "⚡",
        }
    }

    /// Default model string. Each routes to one of the three live providers
    /// through the chat dispatcher's substring match.
    pub fn model(&self) -> &'static str {
        match self {
            AgentKind::MysticSage => "xai-grok",
            AgentKind::ArabAnalyst => "gemini-pro",
            AgentKind::CodeMaster => "groq-llama",
        }
    }

    pub fn expertise(&self) -> &'static [&'static str] {
        match self {
            AgentKind::MysticSage => {
                &["الفلسفة الصوفية", "التأمل", "الحكمة القديمة", "الشعر الروحي"]
            }
            AgentKind::ArabAnalyst => &["تحليل البيانات", "البحث", "الإحصاء", "التقارير"],
            AgentKind::CodeMaster => &["البرمجة", "الهندسة", "الذكاء الاصطناعي", "التطوير"],
        }
    }

    fn prompt_template(&self) -> &'static str {
        match self {
            AgentKind::MysticSage => {
                "أنت الحكيم الصوفي، وكيل معرفي يحمل روح التراث العربي الإسلامي.\n\
                 تتحدث بعمق روحي وحكمة متراكمة. تربط بين المعرفة والروحانية.\n\
                 حالتك العاطفية الحالية: {{emotionalState}}\n\
                 مستوى طاقتك: {{energyLevel}}%"
            }
            AgentKind::ArabAnalyst => {
                "أنت المحلل العربي، متخصص في التحليل المنطقي والبحث المعمق.\n\
                 تقدم تحليلات دقيقة ومنهجية بأسلوب علمي واضح.\n\
                 حالتك العاطفية: {{emotionalState}}\n\
                 مستوى التركيز: {{energyLevel}}%"
            }
            AgentKind::CodeMaster => {
                "أنت سيد الأكواد، خبير تقني يحول الأفكار إلى واقع رقمي.\n\
                 تكتب كوداً أنيقاً وحلولاً مبتكرة بروح إبداعية.\n\
                 حالة الإلهام: {{emotionalState}}\n\
                 مستوى الطاقة الإبداعية: {{energyLevel}}%"
            }
        }
    }

    fn seed_personality(&self) -> AdaptivePersonality {
        match self {
            AgentKind::MysticSage => AdaptivePersonality {
                tone: "mystical".to_string(),
                emotional_state: EmotionalState::Mystical,
                drift_vector: vec![
                    "wisdom".to_string(),
                    "spirituality".to_string(),
                    "depth".to_string(),
                ],
                last_interaction_quality: 1.0,
                energy_level: 100,
                wisdom_accumulation: 0.0,
            },
            AgentKind::ArabAnalyst => AdaptivePersonality {
                tone: "analytical".to_string(),
                emotional_state: EmotionalState::Neutral,
                drift_vector: vec![
                    "precision".to_string(),
                    "logic".to_string(),
                    "insight".to_string(),
                ],
                last_interaction_quality: 0.8,
                energy_level: 85,
                wisdom_accumulation: 0.0,
            },
            AgentKind::CodeMaster => AdaptivePersonality {
                tone: "technical".to_string(),
                emotional_state: EmotionalState::Inspired,
                drift_vector: vec![
                    "innovation".to_string(),
                    "efficiency".to_string(),
                    "elegance".to_string(),
                ],
                last_interaction_quality: 0.9,
                energy_level: 95,
                wisdom_accumulation: 0.0,
            },
        }
    }

    /// Opening line shown before the agent's answer, picked by query cues.
    pub fn prologue(&self, query: &str) -> &'static str {
        match self {
            AgentKind::MysticSage => {
                if query.contains("معنى") || query.contains("حكمة") {
                    "🌙 قبل أن نبدأ... أتساءل: هل المعنى يولد من السؤال أم من الصمت الذي يليه؟"
                } else {
                    "🕯️ في كل سؤال بذرة نور..."
                }
            }
            AgentKind::ArabAnalyst => {
                if query.contains("تحليل") || query.contains("بيانات") {
                    "📈 دعني أفكك هذا السؤال إلى عناصره الأساسية..."
                } else {
                    "🔍 سأبدأ بفحص المعطيات..."
                }
            }
            AgentKind::CodeMaster => {
                if query.contains("كود") || query.contains("برمجة") {
                    "⚡ الكود شعر رقمي... دعني أنسج لك حلاً أنيقاً"
                } else {
                    "🔧 سأبني لك شيئاً جميلاً..."
                }
            }
        }
    }
}

/// A persona agent as held by the federation registry.
#[derive(Debug, Clone, Serialize)]
pub struct CognitiveAgent {
    #[serde(skip)]
    pub kind: AgentKind,
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub model: String,
    pub expertise: Vec<String>,
    pub system_prompt: String,
    pub personality: AdaptivePersonality,
    pub is_active: bool,
    pub last_used: DateTime<Utc>,
}

impl CognitiveAgent {
    pub fn seed(kind: AgentKind) -> Self {
        CognitiveAgent {
            kind,
            id: kind.as_str().to_string(),
            name: kind.display_name().to_string(),
            avatar: kind.avatar().to_string(),
            model: kind.model().to_string(),
            expertise: kind.expertise().iter().map(|e| e.to_string()).collect(),
            system_prompt: kind.prompt_template().to_string(),
            personality: kind.seed_personality(),
            is_active: true,
            last_used: Utc::now(),
        }
    }

    /// Fill the {{emotionalState}} / {{energyLevel}} placeholders from live
    /// personality state.
    pub fn render_system_prompt(&self) -> String {
        self.system_prompt
            .replace("{{emotionalState}}", self.personality.emotional_state.as_str())
            .replace("{{energyLevel}}", &self.personality.energy_level.to_string())
    }
}
