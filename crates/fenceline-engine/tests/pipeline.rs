use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;

use fenceline_engine::{
    AnchorFallback, Annotation, AnnotationRender, Block, CopyTransform, Engine, EngineError,
    InlineRange, InsertPosition, Node, Phase, Plugin, RenderTransform, RenderedLine,
    extract_blocks,
};

/// Records every hook invocation so phase ordering is observable.
struct Probe {
    log: Arc<Mutex<Vec<String>>>,
}

impl Probe {
    fn push(&self, entry: &str) {
        self.log.lock().unwrap().push(entry.to_string());
    }
}

impl Plugin for Probe {
    fn name(&self) -> &str {
        "probe"
    }

    fn preprocess_language(&self, block: &mut Block) -> anyhow::Result<()> {
        self.push(&format!("preprocess_language:{}", block.language()));
        Ok(())
    }

    fn preprocess_metadata(&self, _block: &mut Block) -> anyhow::Result<()> {
        self.push("preprocess_metadata");
        Ok(())
    }

    fn preprocess_code(&self, _block: &mut Block) -> anyhow::Result<()> {
        self.push("preprocess_code");
        Ok(())
    }

    fn perform_syntax_analysis(&self, _block: &mut Block) -> anyhow::Result<()> {
        self.push("perform_syntax_analysis");
        Ok(())
    }

    fn postprocess_analyzed_code(&self, _block: &mut Block) -> anyhow::Result<()> {
        self.push("postprocess_analyzed_code");
        Ok(())
    }

    fn annotate_code(&self, _block: &mut Block) -> anyhow::Result<()> {
        self.push("annotate_code");
        Ok(())
    }

    fn postprocess_annotations(&self, _block: &mut Block) -> anyhow::Result<()> {
        self.push("postprocess_annotations");
        Ok(())
    }

    fn postprocess_rendered_line(
        &self,
        _block: &Block,
        line: &fenceline_engine::Line,
        _node: &mut Node,
    ) -> anyhow::Result<()> {
        self.push(&format!("postprocess_rendered_line:{}", line.text()));
        Ok(())
    }

    fn postprocess_rendered_block(
        &self,
        _block: &Block,
        _rendered: &mut fenceline_engine::RenderedBlock,
    ) -> anyhow::Result<()> {
        self.push("postprocess_rendered_block");
        Ok(())
    }

    fn postprocess_rendered_block_group(
        &self,
        blocks: &[Block],
        _rendered: &mut [fenceline_engine::RenderedBlock],
    ) -> anyhow::Result<()> {
        self.push(&format!("postprocess_rendered_block_group:{}", blocks.len()));
        Ok(())
    }
}

#[test]
fn test_phases_run_in_fixed_order_per_block_then_group() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut engine = Engine::new();
    engine.add_plugin(Probe { log: Arc::clone(&log) });

    let mut blocks = vec![Block::new("a", "rust", ""), Block::new("b", "js", "")];
    engine.render_group(&mut blocks).unwrap();

    let expected = [
        "preprocess_language:rust",
        "preprocess_metadata",
        "preprocess_code",
        "perform_syntax_analysis",
        "postprocess_analyzed_code",
        "annotate_code",
        "postprocess_annotations",
        "postprocess_rendered_line:a",
        "postprocess_rendered_block",
        "preprocess_language:js",
        "preprocess_metadata",
        "preprocess_code",
        "perform_syntax_analysis",
        "postprocess_analyzed_code",
        "annotate_code",
        "postprocess_annotations",
        "postprocess_rendered_line:b",
        "postprocess_rendered_block",
        "postprocess_rendered_block_group:2",
    ];
    assert_eq!(*log.lock().unwrap(), expected);
}

/// Attempts one gated mutation per phase and records whether it was allowed.
struct CapabilityProbe {
    observed: Arc<Mutex<Vec<(&'static str, bool)>>>,
}

impl CapabilityProbe {
    fn record(&self, what: &'static str, allowed: bool) {
        self.observed.lock().unwrap().push((what, allowed));
    }
}

impl Plugin for CapabilityProbe {
    fn name(&self) -> &str {
        "capability-probe"
    }

    fn preprocess_language(&self, block: &mut Block) -> anyhow::Result<()> {
        self.record("language/set_language", block.set_language("fixed").is_ok());
        self.record("language/insert_lines", block.insert_lines(0, &["x"]).is_ok());
        Ok(())
    }

    fn preprocess_metadata(&self, block: &mut Block) -> anyhow::Result<()> {
        self.record("metadata/set_language", block.set_language("nope").is_ok());
        self.record("metadata/set_meta", block.set_meta("parsed").is_ok());
        self.record("metadata/set_prop", block.set_prop("title", "demo").is_ok());
        Ok(())
    }

    fn preprocess_code(&self, block: &mut Block) -> anyhow::Result<()> {
        self.record("code/insert_lines", block.insert_lines(0, &["inserted"]).is_ok());
        Ok(())
    }

    fn perform_syntax_analysis(&self, block: &mut Block) -> anyhow::Result<()> {
        let edit = block.edit_line_text(0, Some(0), Some(0), "pre ");
        self.record("analysis/edit_line_text", edit.is_ok());
        let annotation = Annotation::inline(
            "tok",
            InlineRange::new(0, 3),
            AnnotationRender::wrap("tok"),
        );
        self.record("analysis/add_annotation", block.add_annotation(0, annotation).is_ok());
        Ok(())
    }

    fn annotate_code(&self, block: &mut Block) -> anyhow::Result<()> {
        self.record("annotate/edit_line_text", block.edit_line_text(0, None, None, "x").is_ok());
        let mark = Annotation::full_line("mark", AnnotationRender::wrap("mark"));
        self.record("annotate/add_annotation", block.add_annotation(0, mark).is_ok());
        self.record(
            "annotate/add_copy_transform",
            block.add_copy_transform(0, CopyTransform::RemoveLine).is_ok(),
        );
        Ok(())
    }

    fn postprocess_rendered_line(
        &self,
        block: &Block,
        _line: &fenceline_engine::Line,
        _node: &mut Node,
    ) -> anyhow::Result<()> {
        let state = block.state();
        let sealed = !state.can_edit_code
            && !state.can_edit_language
            && !state.can_edit_metadata
            && !state.can_edit_annotations;
        self.record("rendered/sealed", sealed);
        Ok(())
    }
}

#[test]
fn test_capability_windows_open_and_close_with_phases() {
    let observed = Arc::new(Mutex::new(Vec::new()));
    let mut engine = Engine::new();
    engine.add_plugin(CapabilityProbe { observed: Arc::clone(&observed) });

    let mut block = Block::new("body", "orig", "");
    engine.render(&mut block).unwrap();

    let expected = [
        ("language/set_language", true),
        ("language/insert_lines", false),
        ("metadata/set_language", false),
        ("metadata/set_meta", true),
        ("metadata/set_prop", true),
        ("code/insert_lines", true),
        ("analysis/edit_line_text", true),
        ("analysis/add_annotation", true),
        ("annotate/edit_line_text", false),
        ("annotate/add_annotation", true),
        ("annotate/add_copy_transform", true),
        // one per rendered line: the inserted line plus the original
        ("rendered/sealed", true),
        ("rendered/sealed", true),
    ];
    assert_eq!(*observed.lock().unwrap(), expected);
    assert_eq!(block.language(), "fixed");
    assert_eq!(block.meta(), "parsed");
}

struct Failing;

impl Plugin for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn annotate_code(&self, _block: &mut Block) -> anyhow::Result<()> {
        anyhow::bail!("marker grammar rejected")
    }
}

#[test]
fn test_hook_error_aborts_with_plugin_and_phase_context() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut engine = Engine::new();
    engine.add_plugin(Failing);
    engine.add_plugin(Probe { log: Arc::clone(&log) });

    let mut block = Block::new("x", "", "");
    let err = engine.render(&mut block).unwrap_err();

    match &err {
        EngineError::PluginFailed { plugin, phase, .. } => {
            assert_eq!(plugin, "failing");
            assert_eq!(*phase, Phase::AnnotateCode);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("failing"));
    assert!(err.to_string().contains("annotate_code"));

    // the probe saw the phases before the failure and nothing after; it
    // never reached annotate_code because the failing plugin runs first
    // within that phase
    let log = log.lock().unwrap();
    assert!(log.contains(&"postprocess_analyzed_code".to_string()));
    assert!(!log.contains(&"annotate_code".to_string()));
    assert!(!log.iter().any(|entry| entry.starts_with("postprocess_rendered_line")));
}

/// Deletes `# cut` directive lines, leaving an ellipsis in the rendered
/// output only, and strips a `# hide` line from the clipboard only.
struct Directives;

impl Plugin for Directives {
    fn name(&self) -> &str {
        "directives"
    }

    fn preprocess_code(&self, block: &mut Block) -> anyhow::Result<()> {
        let doomed: Vec<usize> = block
            .lines()
            .iter()
            .enumerate()
            .filter(|(_, line)| line.text().trim() == "# cut")
            .map(|(index, _)| index)
            .collect();
        for &index in &doomed {
            block.add_render_transform(
                index,
                RenderTransform::insert(InsertPosition::Before, AnchorFallback::StickNext, |factory| {
                    vec![factory.line(vec![Node::text("⋯")])]
                }),
            )?;
        }
        block.delete_lines(&doomed)?;
        Ok(())
    }

    fn annotate_code(&self, block: &mut Block) -> anyhow::Result<()> {
        let hidden: Vec<usize> = block
            .lines()
            .iter()
            .enumerate()
            .filter(|(_, line)| line.text().ends_with("# hide"))
            .map(|(index, _)| index)
            .collect();
        for index in hidden {
            block.add_copy_transform(index, CopyTransform::RemoveLine)?;
            block.add_annotation(
                index,
                Annotation::full_line("dim", AnnotationRender::wrap("dim")),
            )?;
        }
        Ok(())
    }
}

#[test]
fn test_directive_flow_keeps_three_projections_consistent() {
    let code = "setup()\n# cut\nsecret = 1  # hide\nrun()";
    let mut engine = Engine::new();
    engine.add_plugin(Directives);

    let mut block = Block::new(code, "python", "");
    let rendered = engine.render(&mut block).unwrap();

    // canonical text: the directive line is physically gone
    assert_eq!(block.code(), "setup()\nsecret = 1  # hide\nrun()");

    // rendered output: an ellipsis line replaces it, re-anchored onto the
    // next surviving line
    let texts: Vec<String> = rendered
        .lines
        .iter()
        .map(|line: &RenderedLine| line.node.plain_text())
        .collect();
    assert_eq!(texts, ["setup()", "⋯", "secret = 1  # hide", "run()"]);
    assert!(rendered.lines[1].source.is_none());
    assert_eq!(
        rendered.lines[2].node.to_compact_string(),
        "<dim>secret = 1  # hide</dim>"
    );

    // clipboard: the hidden line is absent, the ellipsis never appears
    assert_eq!(rendered.copy_text, "setup()\nrun()");
}

#[test]
fn test_extracted_markdown_blocks_render_as_a_group() {
    let markdown = "\
# Doc

```rust demo
fn main() {}
```

```python
print(1)
```
";
    let mut blocks = extract_blocks(markdown);
    assert_eq!(blocks.len(), 2);

    let engine = Engine::new();
    let rendered = engine.render_group(&mut blocks).unwrap();

    assert_eq!(rendered[0].language, "rust");
    assert_eq!(rendered[0].meta, "demo");
    assert_eq!(rendered[0].copy_text, "fn main() {}");
    assert_eq!(rendered[1].language, "python");
    assert_eq!(rendered[1].copy_text, "print(1)");
}
