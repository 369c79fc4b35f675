//! Pipeline orchestration: intake, background processing and the fixed
//! stage order (resolve, load, extract, validate, persist). Each stage
//! either advances the tracked state or drives the submission to the
//! failed state with the stage's error code.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::extract::registry::ExtractorRegistry;
use crate::loader;
use crate::models::enums::{DocumentFormat, ErrorCode};
use crate::models::submission::{ProcessingState, Submission};
use crate::persist::PersistenceAdapter;
use crate::tracker::{StatusSnapshot, SubmissionTracker, TrackerError};
use crate::validate;

pub struct ReportPipeline {
    config: PipelineConfig,
    registry: ExtractorRegistry,
    tracker: Arc<SubmissionTracker>,
    persistence: Arc<dyn PersistenceAdapter>,
}

impl ReportPipeline {
    pub fn new(
        config: PipelineConfig,
        registry: ExtractorRegistry,
        persistence: Arc<dyn PersistenceAdapter>,
    ) -> Self {
        Self {
            config,
            registry,
            tracker: Arc::new(SubmissionTracker::new()),
            persistence,
        }
    }

    /// Accept a document and start processing it in the background.
    /// Returns immediately with the submission id to poll.
    ///
    /// Intake never rejects on content: an unknown area or undecodable
    /// document still yields an id whose status ends up failed.
    pub fn submit(
        self: &Arc<Self>,
        area_tag: &str,
        format_tag: &str,
        bytes: Vec<u8>,
        principal: &str,
    ) -> Result<Uuid, TrackerError> {
        let submission = Submission::new(area_tag, format_tag, principal);
        let id = submission.id;
        let area = submission.area.clone();
        let format = submission.format.clone();
        self.tracker.register(submission)?;

        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            let worker = Arc::clone(&pipeline);
            let handle = tokio::task::spawn_blocking(move || {
                worker.process(id, &area, &format, &bytes);
            });
            match tokio::time::timeout(pipeline.config.processing_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    tracing::error!(submission_id = %id, error = %join_err, "worker panicked");
                    pipeline.fail(id, ErrorCode::Internal, join_err.to_string());
                }
                Err(_) => {
                    tracing::warn!(submission_id = %id, "processing deadline exceeded");
                    pipeline.fail(id, ErrorCode::Timeout, "processing deadline exceeded");
                }
            }
        });
        Ok(id)
    }

    pub fn status(&self, id: Uuid) -> Result<StatusSnapshot, TrackerError> {
        self.tracker.status(id)
    }

    pub fn tracker(&self) -> &Arc<SubmissionTracker> {
        &self.tracker
    }

    /// Run the stages synchronously. Every exit path leaves the
    /// submission in a terminal state.
    fn process(&self, id: Uuid, area_tag: &str, format_tag: &str, bytes: &[u8]) {
        let format = match DocumentFormat::from_tag(format_tag) {
            Ok(format) => format,
            Err(e) => return self.fail(id, ErrorCode::UnsupportedFormat, e.to_string()),
        };
        // routing is checked before any bytes are parsed
        let extractor = match self.registry.resolve(area_tag, format) {
            Ok(extractor) => extractor,
            Err(e) => return self.fail(id, e.code(), e.to_string()),
        };

        if !self.advance(id, ProcessingState::Parsing) {
            return;
        }
        let view = match loader::load_document(bytes, format, &self.config) {
            Ok(view) => view,
            Err(e) => return self.fail(id, e.code(), e.to_string()),
        };
        let draft = match extractor.extract(&view) {
            Ok(draft) => draft,
            Err(e) => return self.fail(id, e.code(), e.to_string()),
        };

        if !self.advance(id, ProcessingState::Validating) {
            return;
        }
        let record_set = match validate::validate(&draft) {
            Ok(set) => set,
            Err(defects) => {
                tracing::info!(
                    submission_id = %id,
                    defect_count = defects.len(),
                    "validation rejected draft"
                );
                if let Err(e) = self.tracker.fail_with_defects(id, defects) {
                    tracing::error!(submission_id = %id, error = %e, "could not record defects");
                }
                return;
            }
        };

        if !self.advance(id, ProcessingState::Persisting) {
            return;
        }
        match self.persistence.persist(&record_set) {
            Ok(set_ref) => {
                if let Err(e) = self.tracker.succeed(id, set_ref) {
                    tracing::error!(submission_id = %id, error = %e, "could not record success");
                }
            }
            Err(e) => self.fail(id, e.code(), e.to_string()),
        }
    }

    fn advance(&self, id: Uuid, to: ProcessingState) -> bool {
        match self.tracker.advance(id, to) {
            Ok(()) => true,
            // a timeout may have forced the terminal state already
            Err(e) => {
                tracing::warn!(submission_id = %id, to = %to, error = %e, "transition rejected");
                false
            }
        }
    }

    fn fail(&self, id: Uuid, code: ErrorCode, detail: impl Into<String>) {
        let detail = detail.into();
        tracing::info!(submission_id = %id, code = %code, detail = %detail, "submission failed");
        if let Err(e) = self.tracker.fail_with_error(id, code, detail) {
            tracing::warn!(submission_id = %id, error = %e, "could not record failure");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::registry::default_registry;
    use crate::models::enums::DefectCode;
    use crate::persist::{InMemoryPersistence, UnavailablePersistence};
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn docx_bytes(document_xml: &str) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let mut zip = zip::ZipWriter::new(&mut cursor);
        zip.start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap();
        cursor.into_inner()
    }

    fn clean_report() -> Vec<u8> {
        docx_bytes(
            r#"<w:document xmlns:w="x"><w:body>
            <w:p><w:r><w:t>Sprint: 12</w:t></w:r></w:p>
            <w:p><w:r><w:t>Velocity: 42 pts</w:t></w:r></w:p>
            <w:p><w:r><w:t>Orçamento Total: € 1.234,56</w:t></w:r></w:p>
            <w:tbl>
                <w:tr><w:tc><w:p><w:r><w:t>Marco</w:t></w:r></w:p></w:tc>
                      <w:tc><w:p><w:r><w:t>Status</w:t></w:r></w:p></w:tc>
                      <w:tc><w:p><w:r><w:t>Prevista</w:t></w:r></w:p></w:tc>
                      <w:tc><w:p><w:r><w:t>Data Realizada</w:t></w:r></w:p></w:tc></w:tr>
                <w:tr><w:tc><w:p><w:r><w:t>Go-live</w:t></w:r></w:p></w:tc>
                      <w:tc><w:p><w:r><w:t>Concluído</w:t></w:r></w:p></w:tc>
                      <w:tc><w:p><w:r><w:t>01/04/2024</w:t></w:r></w:p></w:tc>
                      <w:tc><w:p><w:r><w:t>03/04/2024</w:t></w:r></w:p></w:tc></w:tr>
            </w:tbl>
        </w:body></w:document>"#,
        )
    }

    fn xlsx_bytes(sheet_xml: &str) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let mut zip = zip::ZipWriter::new(&mut cursor);
        let options = SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(br#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#).unwrap();
        zip.start_file("xl/workbook.xml", options).unwrap();
        zip.write_all(br#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="KPIs" sheetId="1" r:id="rId1"/></sheets></workbook>"#).unwrap();
        zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
        zip.write_all(br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#).unwrap();
        zip.start_file("xl/worksheets/sheet1.xml", options).unwrap();
        zip.write_all(sheet_xml.as_bytes()).unwrap();
        zip.finish().unwrap();
        cursor.into_inner()
    }

    fn pipeline_with(persistence: Arc<dyn PersistenceAdapter>) -> ReportPipeline {
        ReportPipeline::new(PipelineConfig::default(), default_registry(), persistence)
    }

    fn submit_sync(pipeline: &ReportPipeline, area: &str, format: &str, bytes: &[u8]) -> Uuid {
        let submission = Submission::new(area, format, "tester");
        let id = submission.id;
        pipeline.tracker.register(submission).unwrap();
        pipeline.process(id, area, format, bytes);
        id
    }

    #[test]
    fn clean_document_runs_to_success() {
        let store = Arc::new(InMemoryPersistence::new());
        let pipeline = pipeline_with(store.clone());
        let id = submit_sync(&pipeline, "TI", "docx", &clean_report());

        let snapshot = pipeline.status(id).unwrap();
        assert_eq!(snapshot.state, ProcessingState::Succeeded);
        let set = store.get(snapshot.record_set_ref.unwrap()).unwrap();
        assert_eq!(set.period.label, "sprint-12");
        assert_eq!(set.kpis.len(), 2);
        assert_eq!(set.milestones.len(), 1);
    }

    #[test]
    fn duplicated_xlsx_kpi_rows_collapse_and_succeed() {
        let kpi_row = |r: u32| {
            format!(
                r#"<row r="{r}"><c r="A{r}" t="inlineStr"><is><t>velocity</t></is></c><c r="B{r}"><v>42</v></c><c r="C{r}" t="inlineStr"><is><t>points</t></is></c><c r="D{r}" t="inlineStr"><is><t>2024-Q1</t></is></c></row>"#
            )
        };
        let sheet = format!(
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}{}</sheetData></worksheet>"#,
            kpi_row(1),
            kpi_row(2),
        );
        let store = Arc::new(InMemoryPersistence::new());
        let pipeline = pipeline_with(store.clone());
        let id = submit_sync(&pipeline, "TI", "xlsx", &xlsx_bytes(&sheet));

        let snapshot = pipeline.status(id).unwrap();
        assert_eq!(snapshot.state, ProcessingState::Succeeded);
        let set = store.get(snapshot.record_set_ref.unwrap()).unwrap();
        assert_eq!(set.period.label, "2024-Q1");
        assert_eq!(set.kpis.len(), 1);
        assert_eq!(set.kpis[0].name, "velocity");
        assert_eq!(set.kpis[0].value, 42.0);
        assert_eq!(set.kpis[0].unit, "points");
    }

    #[test]
    fn unknown_area_fails_before_parsing() {
        let pipeline = pipeline_with(Arc::new(InMemoryPersistence::new()));
        let id = submit_sync(&pipeline, "finance", "pdf", b"%PDF-1.4 garbage");

        let snapshot = pipeline.status(id).unwrap();
        assert_eq!(snapshot.state, ProcessingState::Failed);
        assert_eq!(snapshot.error_code, Some(ErrorCode::UnknownArea));
    }

    #[test]
    fn valid_area_without_registration_is_unknown() {
        let pipeline = pipeline_with(Arc::new(InMemoryPersistence::new()));
        let id = submit_sync(&pipeline, "RH", "xlsx", &clean_report());

        let snapshot = pipeline.status(id).unwrap();
        assert_eq!(snapshot.state, ProcessingState::Failed);
        assert_eq!(snapshot.error_code, Some(ErrorCode::UnknownArea));
    }

    #[test]
    fn bad_format_tag_fails_as_unsupported() {
        let pipeline = pipeline_with(Arc::new(InMemoryPersistence::new()));
        let id = submit_sync(&pipeline, "TI", "csv", b"a,b,c");

        let snapshot = pipeline.status(id).unwrap();
        assert_eq!(snapshot.error_code, Some(ErrorCode::UnsupportedFormat));
    }

    #[test]
    fn zero_byte_pdf_fails_as_empty_before_extraction() {
        let pipeline = pipeline_with(Arc::new(InMemoryPersistence::new()));
        let id = submit_sync(&pipeline, "TI", "pdf", &[]);

        let snapshot = pipeline.status(id).unwrap();
        assert_eq!(snapshot.state, ProcessingState::Failed);
        assert_eq!(snapshot.error_code, Some(ErrorCode::EmptyDocument));
    }

    #[test]
    fn corrupt_document_fails_in_parsing() {
        let pipeline = pipeline_with(Arc::new(InMemoryPersistence::new()));
        let id = submit_sync(&pipeline, "TI", "docx", b"not a zip archive");

        let snapshot = pipeline.status(id).unwrap();
        assert_eq!(snapshot.state, ProcessingState::Failed);
        assert_eq!(snapshot.error_code, Some(ErrorCode::CorruptDocument));
    }

    #[test]
    fn validation_defects_surface_in_status() {
        let bytes = docx_bytes(
            r#"<w:document xmlns:w="x"><w:body>
            <w:p><w:r><w:t>Sprint: 12</w:t></w:r></w:p>
            <w:p><w:r><w:t>Milestone: Go-live | Status: completo | Prevista: 01/04/2024 | Data Realizada: —</w:t></w:r></w:p>
        </w:body></w:document>"#,
        );
        let pipeline = pipeline_with(Arc::new(InMemoryPersistence::new()));
        let id = submit_sync(&pipeline, "TI", "docx", &bytes);

        let snapshot = pipeline.status(id).unwrap();
        assert_eq!(snapshot.state, ProcessingState::Failed);
        let defects = snapshot.defects.unwrap();
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].code, DefectCode::MissingActualDate);
        assert!(snapshot.error_code.is_none());
    }

    #[test]
    fn persistence_outage_fails_after_validation() {
        let pipeline = pipeline_with(Arc::new(UnavailablePersistence));
        let id = submit_sync(&pipeline, "TI", "docx", &clean_report());

        let snapshot = pipeline.status(id).unwrap();
        assert_eq!(snapshot.state, ProcessingState::Failed);
        assert_eq!(snapshot.error_code, Some(ErrorCode::PersistenceUnavailable));
    }

    #[tokio::test]
    async fn submitted_document_is_pollable_to_completion() {
        let pipeline = Arc::new(pipeline_with(Arc::new(InMemoryPersistence::new())));
        let id = pipeline
            .submit("TI", "docx", clean_report(), "tester")
            .unwrap();

        let snapshot = loop {
            let snapshot = pipeline.status(id).unwrap();
            if snapshot.state.is_terminal() {
                break snapshot;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        };
        assert_eq!(snapshot.state, ProcessingState::Succeeded);
        assert!(snapshot.record_set_ref.is_some());
    }
}
