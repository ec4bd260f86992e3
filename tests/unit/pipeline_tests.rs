/*!
 * Tests for the row pipeline
 */

use std::sync::Arc;

use parking_lot::Mutex;
use sheetlate::app_config::Config;
use sheetlate::translation::lexicon::LexiconEntry;
use sheetlate::translation::pipeline::{RowPlan, RunContext};
use sheetlate::translation::{CancellationFlag, FallbackPolicy, ProgressEvent, RowPipeline};
use crate::common;

#[tokio::test]
async fn test_translate_cell_withSpecExamples_shouldMatchExpectedOutputs() {
    let pipeline = RowPipeline::default();
    let (translator, mock) = common::uppercase_translator(FallbackPolicy::BatchFallback);

    assert_eq!(pipeline.translate_cell("US", "German (de)", &translator).await, "US");
    assert_eq!(pipeline.translate_cell("fr", "German (de)", &translator).await, "FR");
    assert_eq!(pipeline.translate_cell("yes", "German (de)", &translator).await, "Ja");
    assert_eq!(pipeline.translate_cell("no", "French (fr)", &translator).await, "Non");
    assert_eq!(pipeline.translate_cell("yes", "Spanish (es)", &translator).await, "Sí");
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_translate_cell_withTagsAndPlaceholders_shouldPreserveMarkup() {
    let pipeline = RowPipeline::default();
    let (translator, mock) = common::uppercase_translator(FallbackPolicy::BatchFallback);

    let tagged = pipeline.translate_cell("Click <b>here</b> to continue", "fr", &translator).await;
    assert_eq!(tagged, "CLICK <b>HERE</b> TO CONTINUE");

    let placeholder = pipeline.translate_cell("Hello${name}world", "fr", &translator).await;
    assert!(placeholder.contains(" ${name} "));
    assert_eq!(placeholder, "HELLO ${name} WORLD");

    let calls = mock.calls();
    assert!(calls.iter().flatten().all(|unit| !unit.contains('<') && !unit.contains("${")));
}

#[tokio::test]
async fn test_translate_cell_withBatchFailure_shouldRevertToCleanedText() {
    let pipeline = RowPipeline::default();
    let (translator, _) = common::failing_translator(FallbackPolicy::BatchFallback);

    let result = pipeline.translate_cell(" - Save   <b>all..</b> files", "de", &translator).await;
    assert_eq!(result, "Save <b>all.</b> files");
}

#[tokio::test]
async fn test_translate_cell_withUnitFailure_shouldMarkEachUnit() {
    let pipeline = RowPipeline::default();
    let (translator, mock) = common::failing_translator(FallbackPolicy::UnitFallback);

    let result = pipeline.translate_cell("Open <i>file</i>", "de", &translator).await;

    assert_eq!(mock.call_count(), 2);
    assert!(result.starts_with("[API ERROR: "));
    assert!(result.contains("<i>[API ERROR: "));
}

#[tokio::test]
async fn test_translate_cell_withEmptyCell_shouldReturnEmpty() {
    let pipeline = RowPipeline::default();
    let (translator, mock) = common::uppercase_translator(FallbackPolicy::BatchFallback);

    assert_eq!(pipeline.translate_cell("   ", "de", &translator).await, "");
    assert_eq!(pipeline.translate_cell("...", "de", &translator).await, "");
    assert_eq!(mock.call_count(), 0);
}

#[test]
fn test_prepare_shouldBeLanguageIndependent() {
    let pipeline = RowPipeline::default();
    let row = pipeline.prepare("  Save  <b>now</b> ");

    assert_eq!(row.cleaned(), "Save <b>now</b>");
    match row.plan() {
        RowPlan::Segmented { spans, units } => {
            assert_eq!(spans.len(), 4);
            assert_eq!(units.len(), 2);
        }
        RowPlan::Passthrough(_) => panic!("expected a segmented row"),
    }
}

#[test]
fn test_from_config_withCustomSkipAndLexicon_shouldApplyThem() {
    let mut config = Config::default();
    config.skip.region_codes = vec!["BR".to_string()];
    config.lexicon.use_defaults = false;
    config.lexicon.entries = vec![LexiconEntry::new("ja", "yes", "はい")];
    config.translation.rows_per_request = 4;

    let pipeline = RowPipeline::from_config(&config);

    assert_eq!(pipeline.rows_per_request(), 4);
    assert_eq!(pipeline.prepare("br").plan(), &RowPlan::Passthrough("BR".to_string()));
    assert!(matches!(pipeline.prepare("us").plan(), RowPlan::Segmented { .. }));
    assert_eq!(pipeline.lexicon().lookup("Japanese (ja)", "yes"), Some("はい"));
    assert_eq!(pipeline.lexicon().lookup("German (de)", "yes"), None);
}

#[tokio::test]
async fn test_run_language_withRowsPerRequest_shouldSendOneCallPerGroup() {
    let pipeline = RowPipeline::default().with_rows_per_request(2);
    let (translator, mock) = common::uppercase_translator(FallbackPolicy::BatchFallback);
    let rows = pipeline.prepare_rows(&["a <b>b</b>", "yes", "c", "d", "CH"]);

    let run = pipeline.run_language(&rows, "German (de)", &translator, &RunContext::single()).await;

    assert_eq!(run.outputs, vec!["A <b>B</b>", "Ja", "C", "D", "CH"]);
    assert_eq!(mock.calls(), vec![
        common::strings(&["a", "b"]),
        common::strings(&["c", "d"]),
    ]);
}

#[tokio::test]
async fn test_run_language_withProgress_shouldReportOverallPercent() {
    let pipeline = RowPipeline::default();
    let (translator, _) = common::uppercase_translator(FallbackPolicy::BatchFallback);
    let rows = pipeline.prepare_rows(&["a", "b", "c", "d"]);
    let percents = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&percents);

    let context = RunContext {
        language_index: 0,
        language_count: 2,
        progress: Some(Arc::new(move |event: ProgressEvent| sink.lock().push(event.percent()))),
        cancel: CancellationFlag::new(),
    };
    pipeline.run_language(&rows, "fr", &translator, &context).await;

    assert_eq!(*percents.lock(), vec![12.5, 25.0, 37.5, 50.0]);
}
