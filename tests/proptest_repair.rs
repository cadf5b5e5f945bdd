//! Property-based tests for the repair pipeline and the filename inferencer.
//!
//! These tests verify that:
//! - Repairing a file twice gives the same text as repairing it once
//! - Repair never touches files it does not understand
//! - Inferred paths depend only on their inputs and are always normalized

use genforge::naming::{camel_to_kebab, infer_path};
use genforge::{Language, RepairPipeline, SourcePattern};
use proptest::prelude::*;

const IMPORTS: &[&str] = &[
    "import { Button } from '@/components/ui/button'",
    "import { Button } from './ui/button'",
    "import { Tooltip } from 'recharts'",
    "import { LineChart, Line } from 'recharts'",
    "import { Tooltip, TooltipContent } from '@/components/ui/tooltip'",
    "import { Card } from \"@/components/ui/card\";",
    "import { motion } from 'framer-motion'",
    "import React from 'react'",
];

const BODY: &[&str] = &[
    "      <Button>Go</Button>",
    "      <Card><CardHeader><CardTitle>Hi</CardTitle></CardHeader></Card>",
    "      <ArrowRight className=\"h-4 w-4\" />",
    "      <LineChart data={data}><Line dataKey=\"v\" /><Tooltip /></LineChart>",
    "      <Tooltip><TooltipContent>tip</TooltipContent></Tooltip>",
    "      <div className=\"animate-fade-in md:animate-float\" />",
    "      <Badge variant=\"outline\">{label}</Badge>",
    "      <motion.div animate={{ opacity: 1 }} />",
    "      <p>{'<Button> inside a string'}</p>",
    "      {/* <Dialog> in a comment */}",
];

const STYLE_BLOCK: &str = "      <style jsx>{`\n        .x { color: red; }\n      `}</style>";

fn arb_component() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(prop::sample::select(IMPORTS), 0..5),
        prop::collection::vec(prop::sample::select(BODY), 1..6),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(imports, body, with_style, use_client)| {
            let mut out = String::new();
            if use_client {
                out.push_str("\"use client\"\n\n");
            }
            for import in imports {
                out.push_str(import);
                out.push('\n');
            }
            out.push_str("\nexport function Panel({ data, label }) {\n  return (\n    <div>\n");
            for line in body {
                out.push_str(line);
                out.push('\n');
            }
            if with_style {
                out.push_str(STYLE_BLOCK);
                out.push('\n');
            }
            out.push_str("    </div>\n  )\n}\n");
            out
        })
}

proptest! {
    #[test]
    fn repair_is_idempotent(source in arb_component()) {
        let pipeline = RepairPipeline::default();
        let (once, _) = pipeline.repair("components/panel.tsx", &source);
        let (twice, report) = pipeline.repair("components/panel.tsx", &once);
        prop_assert_eq!(&once, &twice);
        prop_assert!(report.applied.is_empty());
        prop_assert!(report.failures.is_empty());
    }

    #[test]
    fn non_script_files_pass_through(source in arb_component()) {
        let (out, report) = RepairPipeline::default().repair("docs/panel.md", &source);
        prop_assert_eq!(out, source);
        prop_assert!(report.is_empty());
    }

    #[test]
    fn inferred_paths_are_pure(
        name in "[A-Z][a-zA-Z0-9]{0,12}",
        index in 1usize..50,
        arrow in any::<bool>(),
    ) {
        let content = if arrow {
            format!("export const {name} = () => <div />")
        } else {
            format!("export default function {name}() {{ return null }}")
        };
        let first = infer_path(&content, SourcePattern::TsxComponent, Language::Tsx, index);
        let second = infer_path(&content, SourcePattern::TsxComponent, Language::Tsx, index);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first, format!("components/{}.tsx", camel_to_kebab(&name)));
    }

    #[test]
    fn kebab_names_are_lowercase(name in "[A-Za-z][A-Za-z0-9_]{0,16}") {
        let kebab = camel_to_kebab(&name);
        prop_assert_eq!(kebab.to_lowercase(), kebab.clone());
        prop_assert!(!kebab.contains('_'));
    }
}
