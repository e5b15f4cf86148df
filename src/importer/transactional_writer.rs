// ==========================================
// 实验室试剂库 - 事务化写入器
// ==========================================
// 职责: 一个批次的全部写入意图在同一事务内执行，
//       按类别计数、按行记录错误，并决定提交/回滚
// 提交策略:
// - AllOrNothing（单实体类型）: 任一写入失败 → 整批回滚
// - BestEffort（统一导入）: 写入失败只记错误；至少一条写入成功才提交
// - dry_run: 总是回滚，计数反映"将会写入"的数量
// ==========================================

use crate::domain::import::ImportCounts;
use crate::domain::types::ImportType;
use crate::importer::error::{ImportResult, RowError};
use crate::importer::row_processor::RowOutcome;
use crate::repository::ReagentRepository;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPolicy {
    AllOrNothing,
    BestEffort,
}

impl CommitPolicy {
    pub fn for_import_type(import_type: ImportType) -> Self {
        if import_type.is_unified() {
            CommitPolicy::BestEffort
        } else {
            CommitPolicy::AllOrNothing
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub dry_run: bool,
    pub validate_orf_references: bool, // 位置/来源引用的 ORF 必须已存在（库中或本批次先写入）
}

/// 批次写入汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub counts: ImportCounts,
    pub errors: Vec<String>, // 按行顺序
    pub committed: bool,
    pub fatal: Option<String>, // AllOrNothing 下触发整批回滚的错误
    pub rows_total: usize,
    pub rows_skipped: usize,
}

pub struct TransactionalWriter<'a> {
    repo: &'a ReagentRepository,
    policy: CommitPolicy,
    options: WriteOptions,
}

impl<'a> TransactionalWriter<'a> {
    pub fn new(repo: &'a ReagentRepository, policy: CommitPolicy, options: WriteOptions) -> Self {
        Self {
            repo,
            policy,
            options,
        }
    }

    /// 执行批次写入
    ///
    /// # 返回
    /// - Ok(WriteSummary): 行级/写入级错误都记录在汇总中
    /// - Err: 无法获取连接或开启/提交事务
    pub fn write(&self, outcomes: &[RowOutcome]) -> ImportResult<WriteSummary> {
        let conn = self.repo.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut summary = WriteSummary {
            rows_total: outcomes.len(),
            ..WriteSummary::default()
        };

        'rows: for outcome in outcomes {
            let processed = match outcome {
                RowOutcome::Skipped { .. } => {
                    summary.rows_skipped += 1;
                    continue;
                }
                RowOutcome::Processed(p) => p,
            };

            for intent in &processed.intents {
                let category = intent.category();

                if self.options.validate_orf_references {
                    if let Some(orf_id) = intent.referenced_orf_id() {
                        if !ReagentRepository::orf_exists_tx(&tx, orf_id)? {
                            let err = RowError::UnknownOrf {
                                row: processed.row_number,
                                orf_id: orf_id.to_string(),
                            };
                            warn!(error = %err, "引用的 ORF 不存在，跳过该写入");
                            summary.errors.push(err.to_string());
                            continue;
                        }
                    }
                }

                match ReagentRepository::apply_intent_tx(&tx, intent) {
                    Ok(()) => summary.counts.record(category),
                    Err(e) => {
                        let err = RowError::Write {
                            row: processed.row_number,
                            entity: category.label().to_string(),
                            message: e.to_string(),
                        };
                        warn!(error = %err, "写入失败");
                        summary.errors.push(err.to_string());

                        if self.policy == CommitPolicy::AllOrNothing {
                            summary.fatal = Some(e.to_string());
                            break 'rows;
                        }
                    }
                }
            }

            // 行级校验错误排在该行写入错误之后
            for err in &processed.errors {
                warn!(error = %err, "行校验失败");
                summary.errors.push(err.to_string());
            }
        }

        let should_commit = match self.policy {
            CommitPolicy::AllOrNothing => summary.fatal.is_none(),
            CommitPolicy::BestEffort => summary.counts.total() > 0,
        };

        if self.options.dry_run || !should_commit {
            tx.rollback()?;
            info!(
                dry_run = self.options.dry_run,
                written = summary.counts.total(),
                errors = summary.errors.len(),
                "事务已回滚"
            );
        } else {
            tx.commit()?;
            summary.committed = true;
            info!(
                written = summary.counts.total(),
                errors = summary.errors.len(),
                "事务已提交"
            );
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{apply_position_uniqueness, init_schema};
    use crate::domain::import::WriteIntent;
    use crate::domain::reagent::{EntryPosition, SourceAttribution};
    use crate::domain::types::ReagentTable;
    use crate::importer::row_processor::ProcessedRow;
    use rusqlite::Connection;
    use std::sync::{Arc, Mutex};

    fn test_repo(unique_positions: bool) -> ReagentRepository {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        apply_position_uniqueness(&conn, unique_positions).unwrap();
        ReagentRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn entry(orf_id: &str) -> WriteIntent {
        WriteIntent::InsertEntryPosition(EntryPosition {
            orf_id: orf_id.to_string(),
            plate: "P1".to_string(),
            well: "A1".to_string(),
            freezer_id: String::new(),
            plasmid_id: String::new(),
            create_date: "2024-05-01".to_string(),
        })
    }

    fn source(orf_id: &str) -> WriteIntent {
        WriteIntent::InsertSource(SourceAttribution {
            orf_id: orf_id.to_string(),
            source_name: "Lab stock".to_string(),
            source_details: String::new(),
            source_url: String::new(),
            submission_date: "2024-05-01".to_string(),
            submitter: String::new(),
            notes: String::new(),
        })
    }

    fn row(row_number: usize, intents: Vec<WriteIntent>) -> RowOutcome {
        RowOutcome::Processed(ProcessedRow {
            row_number,
            intents,
            errors: Vec::new(),
        })
    }

    #[test]
    fn test_all_or_nothing_rolls_back_on_first_failure() {
        let repo = test_repo(true);
        let writer = TransactionalWriter::new(&repo, CommitPolicy::AllOrNothing, WriteOptions::default());

        let summary = writer
            .write(&[row(2, vec![entry("ORF001")]), row(3, vec![entry("ORF001")])])
            .unwrap();

        assert!(!summary.committed);
        assert!(summary.fatal.is_some());
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].starts_with("Row 3: Entry position error:"));
        assert_eq!(repo.count_rows(ReagentTable::OrfPosition).unwrap(), 0);
    }

    #[test]
    fn test_best_effort_commits_successful_subset() {
        let repo = test_repo(true);
        let writer = TransactionalWriter::new(&repo, CommitPolicy::BestEffort, WriteOptions::default());

        let summary = writer
            .write(&[
                row(2, vec![entry("ORF001"), source("ORF001")]),
                row(3, vec![entry("ORF001"), source("ORF001")]),
            ])
            .unwrap();

        assert!(summary.committed);
        assert_eq!(summary.counts.entry_positions, 1);
        assert_eq!(summary.counts.sources, 2);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(repo.count_rows(ReagentTable::OrfSources).unwrap(), 2);
    }

    #[test]
    fn test_best_effort_rolls_back_when_nothing_written() {
        let repo = test_repo(false);
        let writer = TransactionalWriter::new(&repo, CommitPolicy::BestEffort, WriteOptions::default());

        let summary = writer
            .write(&[RowOutcome::Skipped { row_number: 2 }])
            .unwrap();

        assert!(!summary.committed);
        assert_eq!(summary.rows_skipped, 1);
        assert!(summary.errors.is_empty());
    }

    #[test]
    fn test_dry_run_never_persists() {
        let repo = test_repo(false);
        let options = WriteOptions {
            dry_run: true,
            ..WriteOptions::default()
        };
        let writer = TransactionalWriter::new(&repo, CommitPolicy::BestEffort, options);

        let summary = writer.write(&[row(2, vec![entry("ORF001")])]).unwrap();

        assert!(!summary.committed);
        assert_eq!(summary.counts.entry_positions, 1);
        assert_eq!(repo.count_rows(ReagentTable::OrfPosition).unwrap(), 0);
    }

    #[test]
    fn test_orf_reference_validation() {
        let repo = test_repo(false);
        let options = WriteOptions {
            validate_orf_references: true,
            ..WriteOptions::default()
        };
        let writer = TransactionalWriter::new(&repo, CommitPolicy::BestEffort, options);

        let summary = writer.write(&[row(2, vec![source("ORF404")])]).unwrap();

        assert_eq!(summary.errors, vec!["Row 2: Unknown ORF ID 'ORF404'".to_string()]);
        assert_eq!(summary.counts.total(), 0);
        assert!(!summary.committed);
    }
}
