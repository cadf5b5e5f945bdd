//! Closed tables of known generator defects. Rules are built from these
//! entries; adding a defect class means adding a row, not a branch.

/// Path prefixes that resolve to the `@/` alias in a Next.js project.
pub const ALIAS_ROOTS: &[&str] = &["components", "lib", "hooks", "app", "utils", "styles"];

pub const ICON_MODULE: &str = "lucide-react";

/// One UI-kit module and the components it exports.
#[derive(Debug, Clone, Copy)]
pub struct UiModule {
    pub module: &'static str,
    pub components: &'static [&'static str],
}

pub const UI_KIT: &[UiModule] = &[
    UiModule {
        module: "@/components/ui/alert",
        components: &["Alert", "AlertTitle", "AlertDescription"],
    },
    UiModule {
        module: "@/components/ui/button",
        components: &["Button"],
    },
    UiModule {
        module: "@/components/ui/card",
        components: &[
            "Card",
            "CardHeader",
            "CardTitle",
            "CardDescription",
            "CardContent",
            "CardFooter",
        ],
    },
    UiModule {
        module: "@/components/ui/tooltip",
        components: &["Tooltip", "TooltipContent", "TooltipTrigger", "TooltipProvider"],
    },
    UiModule {
        module: "@/components/ui/dialog",
        components: &[
            "Dialog",
            "DialogContent",
            "DialogHeader",
            "DialogTitle",
            "DialogDescription",
            "DialogFooter",
            "DialogTrigger",
            "DialogClose",
        ],
    },
    UiModule {
        module: "@/components/ui/badge",
        components: &["Badge"],
    },
    UiModule {
        module: "@/components/ui/input",
        components: &["Input"],
    },
    UiModule {
        module: "@/components/ui/label",
        components: &["Label"],
    },
    UiModule {
        module: "@/components/ui/tabs",
        components: &["Tabs", "TabsList", "TabsTrigger", "TabsContent"],
    },
    UiModule {
        module: "@/components/ui/separator",
        components: &["Separator"],
    },
    UiModule {
        module: "@/components/ui/progress",
        components: &["Progress"],
    },
];

pub const ICONS: &[&str] = &[
    "ArrowRight",
    "CheckCircle",
    "Lightbulb",
    "Microscope",
    "Scale",
    "Target",
    "GraduationCap",
    "BrainCircuit",
    "Beaker",
    "FlaskConical",
    "TestTube",
    "BookOpen",
    "Calculator",
    "ChevronDown",
    "ChevronRight",
    "Info",
    "AlertCircle",
    "Check",
    "X",
    "Plus",
    "Minus",
    "Star",
    "Heart",
    "Eye",
    "EyeOff",
    "Search",
    "Filter",
    "Settings",
    "Menu",
    "Home",
    "User",
    "Mail",
    "Phone",
    "Calendar",
    "Clock",
    "MapPin",
    "Edit",
    "Trash",
    "Download",
    "Upload",
    "Share",
    "Copy",
    "ExternalLink",
    "Zap",
    "Cpu",
    "Database",
    "Server",
    "Code",
    "Terminal",
    "Globe",
];

/// A symbol exported both by a library and by the UI kit.
#[derive(Debug, Clone, Copy)]
pub struct Collision {
    pub symbol: &'static str,
    pub library_module: &'static str,
    pub library_alias: &'static str,
    pub kit_module: &'static str,
    /// Prefix for every specifier of the kit import once the collision is resolved.
    pub kit_alias_prefix: &'static str,
    /// Elements whose children refer to the library's symbol.
    pub containers: &'static [&'static str],
}

pub const COLLISIONS: &[Collision] = &[Collision {
    symbol: "Tooltip",
    library_module: "recharts",
    library_alias: "RechartsTooltip",
    kit_module: "@/components/ui/tooltip",
    kit_alias_prefix: "UI",
    containers: &[
        "LineChart",
        "BarChart",
        "AreaChart",
        "PieChart",
        "ComposedChart",
        "RadarChart",
        "ScatterChart",
        "RadialBarChart",
    ],
}];

/// Custom animation classes the generator invents, and their built-in stand-ins.
pub const ANIMATION_CLASSES: &[(&str, &str)] = &[
    ("animate-bubble-up-1", "animate-bounce"),
    ("animate-bubble-up-2", "animate-pulse"),
    ("animate-bubble-up-3", "animate-ping"),
    ("animate-bubble-up", "animate-bounce"),
    ("animate-fade-in", "animate-pulse"),
    ("animate-slide-up", "animate-bounce"),
    ("animate-float", "animate-pulse"),
];

/// Fields of a state object that a known function uses unqualified.
#[derive(Debug, Clone, Copy)]
pub struct ScopeFix {
    pub function: &'static str,
    pub object: &'static str,
    pub fields: &'static [&'static str],
}

pub const SCOPE_FIXES: &[ScopeFix] = &[ScopeFix {
    function: "generateTrajectory",
    object: "state",
    fields: &["initialVelocity", "angle", "initialHeight"],
}];

/// A closing tag the generator emits without its opener, and the one it meant.
#[derive(Debug, Clone, Copy)]
pub struct TagFix {
    pub wrong: &'static str,
    pub right: &'static str,
}

pub const TAG_FIXES: &[TagFix] = &[TagFix {
    wrong: "Title",
    right: "CardTitle",
}];
