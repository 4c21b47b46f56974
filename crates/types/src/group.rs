//! Package groups and the section table used to derive them

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Group {
    Unknown,
    Accessibility,
    Accessories,
    AdminTools,
    Communication,
    DesktopGnome,
    DesktopKde,
    DesktopOther,
    DesktopXfce,
    Documentation,
    Education,
    Electronics,
    Fonts,
    Games,
    Graphics,
    Internet,
    Legacy,
    Localization,
    Multimedia,
    Network,
    Office,
    Other,
    Programming,
    Publishing,
    Science,
    Servers,
    System,
}

const SECTION_GROUPS: &[(&str, Group)] = &[
    ("Accessibility", Group::Accessibility),
    ("Archiving/Backup", Group::AdminTools),
    ("Archiving/Cd burning", Group::Accessories),
    ("Archiving/Compression", Group::Accessories),
    ("Archiving/Other", Group::Accessories),
    ("Books/Computer books", Group::Documentation),
    ("Books/Faqs", Group::Documentation),
    ("Books/Howtos", Group::Documentation),
    ("Books/Literature", Group::Education),
    ("Books/Other", Group::Education),
    ("Communications", Group::Communication),
    ("Databases", Group::Other),
    ("Development/C", Group::Programming),
    ("Development/C++", Group::Programming),
    ("Development/Databases", Group::Programming),
    ("Development/Debug", Group::Programming),
    ("Development/Debuggers", Group::Programming),
    ("Development/Documentation", Group::Documentation),
    ("Development/Erlang", Group::Programming),
    ("Development/Functional", Group::Programming),
    ("Development/GNOME and GTK+", Group::Programming),
    ("Development/Haskell", Group::Programming),
    ("Development/Java", Group::Programming),
    ("Development/KDE and QT", Group::Programming),
    ("Development/Kernel", Group::Programming),
    ("Development/Lisp", Group::Programming),
    ("Development/ML", Group::Programming),
    ("Development/Objective-C", Group::Programming),
    ("Development/Other", Group::Programming),
    ("Development/Perl", Group::Programming),
    ("Development/Python", Group::Programming),
    ("Development/Python3", Group::Programming),
    ("Development/Ruby", Group::Programming),
    ("Development/Scheme", Group::Programming),
    ("Development/Tcl", Group::Programming),
    ("Development/Tools", Group::Programming),
    ("Documentation", Group::Documentation),
    ("Editors", Group::Publishing),
    ("Education", Group::Education),
    ("Emulators", Group::System),
    ("Engineering", Group::Electronics),
    ("File tools", Group::Accessories),
    ("Games/Adventure", Group::Games),
    ("Games/Arcade", Group::Games),
    ("Games/Boards", Group::Games),
    ("Games/Cards", Group::Games),
    ("Games/Educational", Group::Games),
    ("Games/Other", Group::Games),
    ("Games/Puzzles", Group::Games),
    ("Games/Sports", Group::Games),
    ("Games/Strategy", Group::Games),
    ("Graphical desktop/Enlightenment", Group::DesktopOther),
    ("Graphical desktop/FVWM based", Group::DesktopOther),
    ("Graphical desktop/GNOME", Group::DesktopGnome),
    ("Graphical desktop/GNUstep", Group::DesktopOther),
    ("Graphical desktop/Icewm", Group::DesktopOther),
    ("Graphical desktop/KDE", Group::DesktopKde),
    ("Graphical desktop/MATE", Group::DesktopOther),
    ("Graphical desktop/Motif", Group::DesktopOther),
    ("Graphical desktop/Other", Group::DesktopOther),
    ("Graphical desktop/Rox", Group::DesktopOther),
    ("Graphical desktop/Sawfish", Group::DesktopOther),
    ("Graphical desktop/Sugar", Group::DesktopOther),
    ("Graphical desktop/Window Maker", Group::DesktopOther),
    ("Graphical desktop/XFce", Group::DesktopXfce),
    ("Graphics", Group::Graphics),
    ("Monitoring", Group::Accessories),
    ("Networking/Chat", Group::Communication),
    ("Networking/DNS", Group::Network),
    ("Networking/File transfer", Group::Network),
    ("Networking/FTN", Group::Network),
    ("Networking/IRC", Group::Communication),
    ("Networking/Instant messaging", Group::Communication),
    ("Networking/Mail", Group::Internet),
    ("Networking/News", Group::Internet),
    ("Networking/Other", Group::Network),
    ("Networking/Remote access", Group::Network),
    ("Networking/WWW", Group::Internet),
    ("Office", Group::Office),
    ("Other", Group::Other),
    ("Publishing", Group::Publishing),
    ("Sciences/Astronomy", Group::Science),
    ("Sciences/Biology", Group::Science),
    ("Sciences/Chemistry", Group::Science),
    ("Sciences/Computer science", Group::Science),
    ("Sciences/Geosciences", Group::Science),
    ("Sciences/Mathematics", Group::Science),
    ("Sciences/Medicine", Group::Science),
    ("Sciences/Other", Group::Science),
    ("Sciences/Physics", Group::Science),
    ("Security/Antivirus", Group::Science),
    ("Security/Networking", Group::Science),
    ("Shells", Group::System),
    ("Sound", Group::Multimedia),
    ("System/Base", Group::System),
    ("System/Configuration/Boot and Init", Group::System),
    ("System/Configuration/Hardware", Group::AdminTools),
    ("System/Configuration/Networking", Group::Network),
    ("System/Configuration/Other", Group::System),
    ("System/Configuration/Packaging", Group::AdminTools),
    ("System/Configuration/Printing", Group::System),
    ("System/Fonts/Console", Group::Fonts),
    ("System/Fonts/True type", Group::Fonts),
    ("System/Fonts/Type1", Group::Fonts),
    ("System/Fonts/X11 bitmap", Group::Fonts),
    ("System/Internationalization", Group::Localization),
    ("System/Kernel and hardware", Group::AdminTools),
    ("System/Libraries", Group::System),
    ("System/Legacy libraries", Group::Legacy),
    ("System/Servers", Group::Servers),
    ("System/Servers/ZProducts", Group::Unknown),
    ("System/X11", Group::DesktopOther),
    ("System/XFree86", Group::DesktopOther),
    ("Terminals", Group::DesktopOther),
    ("Text tools", Group::Publishing),
    ("Toys", Group::Games),
    ("Video", Group::Multimedia),
];

impl Group {
    /// Map a full section string to its group. Unlisted sections are `Unknown`.
    #[must_use]
    pub fn from_section(section: &str) -> Self {
        SECTION_GROUPS
            .iter()
            .find(|(name, _)| *name == section)
            .map_or(Self::Unknown, |(_, group)| *group)
    }

    /// Parse a client group name such as `programming` or `desktop-kde`
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
    }
}
