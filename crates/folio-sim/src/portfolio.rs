//! Static portfolio content shown in each zone's panel.

use crate::zones::ZoneId;

/// A short trait badge on the about panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trait {
    pub emoji: &'static str,
    pub label: &'static str,
}

/// A skill with a proficiency percentage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Skill {
    pub name: &'static str,
    pub level: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Project {
    pub name: &'static str,
    pub description: &'static str,
    pub tech: &'static [&'static str],
}

/// One entry in the experience timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Role {
    pub title: &'static str,
    pub company: &'static str,
    pub period: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContactChannel {
    pub icon: &'static str,
    pub label: &'static str,
    pub value: &'static str,
}

/// Body of a panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelBody {
    About {
        paragraphs: &'static [&'static str],
        traits: &'static [Trait],
    },
    Skills(&'static [Skill]),
    Projects(&'static [Project]),
    Experience(&'static [Role]),
    Contact {
        intro: &'static str,
        channels: &'static [ContactChannel],
    },
}

/// Everything needed to render a zone's marker and panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Panel {
    pub title: &'static str,
    pub icon: &'static str,
    /// Accent colour as sRGB bytes.
    pub color: [u8; 3],
    pub body: PanelBody,
}

const ABOUT: Panel = Panel {
    title: "About Me",
    icon: "👤",
    color: [0xff, 0x6b, 0x35],
    body: PanelBody::About {
        paragraphs: &[
            "Hi! I'm a Full-Stack Developer passionate about creating immersive digital experiences.",
            "I love turning complex problems into simple, beautiful solutions. When I'm not coding, \
             you'll find me exploring new technologies, contributing to open source, or playing \
             video games.",
        ],
        traits: &[
            Trait {
                emoji: "🎮",
                label: "Gamer",
            },
            Trait {
                emoji: "🎨",
                label: "Designer",
            },
            Trait {
                emoji: "💻",
                label: "Developer",
            },
        ],
    },
};

const SKILLS: Panel = Panel {
    title: "Skills",
    icon: "⚡",
    color: [0xf7, 0xc5, 0x48],
    body: PanelBody::Skills(&[
        Skill {
            name: "React",
            level: 95,
        },
        Skill {
            name: "TypeScript",
            level: 90,
        },
        Skill {
            name: "Three.js",
            level: 85,
        },
        Skill {
            name: "Node.js",
            level: 88,
        },
        Skill {
            name: "Python",
            level: 80,
        },
        Skill {
            name: "WebGL",
            level: 75,
        },
    ]),
};

const PROJECTS: Panel = Panel {
    title: "Projects",
    icon: "🚀",
    color: [0x9b, 0x5d, 0xe5],
    body: PanelBody::Projects(&[
        Project {
            name: "3D Portfolio",
            description: "Interactive WebGL experience",
            tech: &["Three.js", "React"],
        },
        Project {
            name: "E-Commerce Platform",
            description: "Full-stack shopping experience",
            tech: &["Next.js", "Stripe"],
        },
        Project {
            name: "AI Chat App",
            description: "Real-time AI conversations",
            tech: &["OpenAI", "WebSocket"],
        },
    ]),
};

const EXPERIENCE: Panel = Panel {
    title: "Experience",
    icon: "💼",
    color: [0x00, 0xf5, 0xd4],
    body: PanelBody::Experience(&[
        Role {
            title: "Senior Developer",
            company: "Tech Corp",
            period: "2022 - Present",
        },
        Role {
            title: "Full-Stack Developer",
            company: "StartupXYZ",
            period: "2020 - 2022",
        },
        Role {
            title: "Junior Developer",
            company: "WebAgency",
            period: "2018 - 2020",
        },
    ]),
};

const CONTACT: Panel = Panel {
    title: "Contact",
    icon: "✉️",
    color: [0xf1, 0x5b, 0xb5],
    body: PanelBody::Contact {
        intro: "Let's build something amazing together!",
        channels: &[
            ContactChannel {
                icon: "📧",
                label: "Email",
                value: "hello@myportfolio.dev",
            },
            ContactChannel {
                icon: "🐙",
                label: "GitHub",
                value: "github.com/myprofile",
            },
            ContactChannel {
                icon: "💼",
                label: "LinkedIn",
                value: "linkedin.com/in/myprofile",
            },
            ContactChannel {
                icon: "🐦",
                label: "Twitter",
                value: "@myhandle",
            },
        ],
    },
};

/// Panel content for a zone.
pub fn panel(zone: ZoneId) -> &'static Panel {
    match zone {
        ZoneId::About => &ABOUT,
        ZoneId::Skills => &SKILLS,
        ZoneId::Projects => &PROJECTS,
        ZoneId::Experience => &EXPERIENCE,
        ZoneId::Contact => &CONTACT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_zone_has_a_panel() {
        for zone in ZoneId::ALL {
            let panel = panel(zone);
            assert!(!panel.title.is_empty());
            assert!(!panel.icon.is_empty());
        }
        assert_eq!(panel(ZoneId::About).title, ZoneId::About.label());
    }

    #[test]
    fn test_skill_levels_are_percentages() {
        let PanelBody::Skills(skills) = panel(ZoneId::Skills).body else {
            panic!("skills panel has the wrong body");
        };
        assert_eq!(skills.len(), 6);
        assert!(skills.iter().all(|skill| skill.level <= 100));
    }

    #[test]
    fn test_bodies_match_zones() {
        assert!(matches!(panel(ZoneId::About).body, PanelBody::About { .. }));
        assert!(matches!(
            panel(ZoneId::Experience).body,
            PanelBody::Experience(roles) if roles.len() == 3
        ));
        assert!(matches!(
            panel(ZoneId::Contact).body,
            PanelBody::Contact { channels, .. } if channels.len() == 4
        ));
    }
}
