// ==========================================
// 导入流程集成测试
// ==========================================
// 覆盖: 幂等 upsert、追加写入、哨兵行、统一导入部分提交、必填列缺失、
//       单实体类型整批回滚、dry_run、Excel 输入
// ==========================================


use chrono::Local;
use reagent_db::config::ImportSettings;
use reagent_db::domain::types::{PositionType, ReagentTable};
use reagent_db::importer::{build_template, ImportOptions, ImportProfiles, RawTable, ReagentImporter};
use reagent_db::ImportType;
use test_helpers::{create_test_importer, UNIFIED_HEADER};

fn csv_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_orf_sequence_upsert_is_idempotent() {
    let (dir, importer) = create_test_importer(ImportSettings::default()).unwrap();

    let first = csv_file(
        &dir,
        "first.csv",
        "orf_id,orf_name,orf_sequence,orf_entrez_id\nORF001,TP53,ATGGAG,7157.0\n",
    );
    let second = csv_file(
        &dir,
        "second.csv",
        "Gene ID,Gene Name,Sequence\nORF001,TP53 (revised),ATGGAGGAG\n",
    );

    let report = importer
        .import_file(&first, "orf_sequence", ImportOptions::default())
        .await;
    assert!(report.success, "{}", report.message);
    assert_eq!(report.message, "Successfully imported 1 orf_sequence entries");

    let report = importer
        .import_file(&second, "orf_sequence", ImportOptions::default())
        .await;
    assert!(report.success, "{}", report.message);

    let repo = importer.repository();
    assert_eq!(repo.count_rows(ReagentTable::OrfSequence).unwrap(), 1);
    let orf = repo.find_orf_sequence("ORF001").unwrap().unwrap();
    assert_eq!(orf.name, "TP53 (revised)");
    assert_eq!(orf.sequence, "ATGGAGGAG");
    // 第二次导入未提供 entrez，整行覆盖
    assert_eq!(orf.entrez_id, "");
}

#[tokio::test]
async fn test_entry_positions_append_without_constraint() {
    let (dir, importer) = create_test_importer(ImportSettings::default()).unwrap();
    let file = csv_file(&dir, "pos.csv", "orf_id,plate,well\nORF001,P1,A1\n");

    for _ in 0..2 {
        let report = importer
            .import_file(&file, "orf_position", ImportOptions::default())
            .await;
        assert!(report.success, "{}", report.message);
    }

    let positions = importer.repository().list_entry_positions("ORF001").unwrap();
    assert_eq!(positions.len(), 2);
    assert_eq!(positions[0].create_date, Local::now().format("%Y-%m-%d").to_string());
}

#[tokio::test]
async fn test_sentinel_rows_never_written_for_any_type() {
    let (_dir, importer) = create_test_importer(ImportSettings::default()).unwrap();
    let profiles = ImportProfiles::standard();

    for import_type in ImportType::ALL {
        let template = build_template(profiles.profile(import_type).unwrap(), "2024-05-01");
        let mut table = RawTable::new(template.headers.clone());
        for (idx, row) in template.rows.iter().enumerate() {
            table.push_record(idx + 2, row.clone());
        }

        let report = importer
            .import_table(table, import_type.as_str(), ImportOptions::default())
            .await;

        assert_eq!(report.rows_skipped, 2, "{}", import_type);
        assert_eq!(report.counts.total(), 0, "{}", import_type);
        assert!(report.errors.is_empty(), "{}: {:?}", import_type, report.errors);
    }

    for table in ReagentTable::ALL {
        assert_eq!(importer.repository().count_rows(table).unwrap(), 0);
    }
}

#[tokio::test]
async fn test_unified_partial_commit() {
    let (dir, importer) = create_test_importer(ImportSettings {
        unique_positions: true,
        ..ImportSettings::default()
    })
    .unwrap();

    let content = format!(
        "{}\n{}\n{}\n{}\n",
        UNIFIED_HEADER,
        "ORF001,TP53,ATGGAGGAG,Lab stock,P1,A1,yes,,",
        "ORF002,BRCA1,ATGGATTTA,,,,P2-B1,,",
        "ORF001,TP53,ATGGAGGAGCCG,Collaborator,,,P1-A1,Y1-C3,",
    );
    let file = csv_file(&dir, "unified.csv", &content);

    let report = importer
        .import_file(&file, "unified_position", ImportOptions::default())
        .await;

    assert!(report.success, "{}", report.message);
    assert!(report.committed);
    assert_eq!(report.counts.sequences, 2);
    assert_eq!(report.counts.entry_positions, 1);
    assert_eq!(report.counts.ad_positions, 1);
    assert_eq!(report.counts.sources, 2);
    assert_eq!(report.errors.len(), 2, "{:?}", report.errors);
    assert_eq!(report.errors[0], "Row 3: Missing required value(s): source_name");
    assert!(report.errors[1].starts_with("Row 4: Entry position error:"));
    assert!(report.message.contains("Errors (2):"));

    let repo = importer.repository();
    assert!(repo.find_orf_sequence("ORF002").unwrap().is_none());
    assert_eq!(
        repo.find_orf_sequence("ORF001").unwrap().unwrap().sequence,
        "ATGGAGGAGCCG"
    );
    assert_eq!(repo.list_entry_positions("ORF001").unwrap().len(), 1);
    let sources = repo.list_sources("ORF001").unwrap();
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[1].source_name, "Collaborator");
    let yeast = repo.list_yeast_positions("ORF001").unwrap();
    assert_eq!(yeast.len(), 1);
    assert_eq!(yeast[0].position_type, PositionType::Ad);
    assert_eq!((yeast[0].plate.as_str(), yeast[0].well.as_str()), ("Y1", "C3"));
}

#[tokio::test]
async fn test_unified_duplicate_position_rejected_on_reimport() {
    let (dir, importer) = create_test_importer(ImportSettings {
        unique_positions: true,
        ..ImportSettings::default()
    })
    .unwrap();
    let content = format!("{}\n{}\n", UNIFIED_HEADER, "ORF001,TP53,ATG,Lab stock,P1,A1,yes,,");
    let file = csv_file(&dir, "unified.csv", &content);

    let first = importer
        .import_file(&file, "unified_position", ImportOptions::default())
        .await;
    let second = importer
        .import_file(&file, "unified_position", ImportOptions::default())
        .await;

    assert!(first.errors.is_empty());
    assert!(second.committed);
    assert_eq!(second.errors.len(), 1);
    assert_eq!(importer.repository().list_entry_positions("ORF001").unwrap().len(), 1);
    assert_eq!(importer.repository().list_sources("ORF001").unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_required_column_fails_immediately() {
    let (dir, importer) = create_test_importer(ImportSettings::default()).unwrap();
    let file = csv_file(&dir, "seq.csv", "orf_id,orf_name\nORF001,TP53\n");

    let report = importer
        .import_file(&file, "orf_sequence", ImportOptions::default())
        .await;

    assert!(!report.success);
    assert_eq!(report.rows_total, 0);
    assert_eq!(
        report.message,
        "Missing required column(s) for orf_sequence: orf_sequence"
    );
    assert_eq!(
        importer.repository().count_rows(ReagentTable::OrfSequence).unwrap(),
        0
    );
}

#[tokio::test]
async fn test_simple_type_write_error_rolls_back_batch() {
    let (dir, importer) = create_test_importer(ImportSettings {
        unique_positions: true,
        ..ImportSettings::default()
    })
    .unwrap();
    let file = csv_file(
        &dir,
        "pos.csv",
        "orf_id,plate,well\nORF001,P1,A1\nORF002,P1,A2\nORF001,P1,A1\n",
    );

    let report = importer
        .import_file(&file, "orf_position", ImportOptions::default())
        .await;

    assert!(!report.success);
    assert!(!report.committed);
    assert!(report.message.starts_with("Database error:"), "{}", report.message);
    assert_eq!(
        importer.repository().count_rows(ReagentTable::OrfPosition).unwrap(),
        0
    );
}

#[tokio::test]
async fn test_empty_required_cell_skips_row_only() {
    let (dir, importer) = create_test_importer(ImportSettings::default()).unwrap();
    let file = csv_file(
        &dir,
        "organisms.csv",
        "organism_id,organism_name\nORG001,E. coli\nORG002,\nORG003,S. cerevisiae\n",
    );

    let report = importer
        .import_file(&file, "organism", ImportOptions::default())
        .await;

    assert!(report.success);
    assert_eq!(report.counts.organisms, 2);
    assert_eq!(
        report.errors,
        vec!["Row 3: Missing required value(s): organism_name".to_string()]
    );
}

#[tokio::test]
async fn test_dry_run_reports_counts_without_writing() {
    let (dir, importer) = create_test_importer(ImportSettings::default()).unwrap();
    let file = csv_file(
        &dir,
        "freezers.csv",
        "freezer_id,freezer_location\nFRZ001,Room 101\nFRZ002,Room 102\n",
    );
    let options = ImportOptions {
        dry_run: true,
        ..ImportOptions::default()
    };

    let report = importer.import_file(&file, "freezer", options).await;

    assert!(report.success);
    assert!(report.dry_run);
    assert!(!report.committed);
    assert_eq!(report.counts.freezers, 2);
    assert_eq!(importer.repository().count_rows(ReagentTable::Freezer).unwrap(), 0);
}

#[tokio::test]
async fn test_yeast_position_type_coercion() {
    let (dir, importer) = create_test_importer(ImportSettings::default()).unwrap();
    let file = csv_file(
        &dir,
        "yeast.csv",
        "orf_id,plate,well,type\nORF001,Y1,A1,db\nORF001,Y1,A2,prey\nORF001,Y1,A3,\n",
    );

    let report = importer
        .import_file(&file, "yeast_orf_position", ImportOptions::default())
        .await;
    assert!(report.success, "{}", report.message);

    let types: Vec<PositionType> = importer
        .repository()
        .list_yeast_positions("ORF001")
        .unwrap()
        .into_iter()
        .map(|p| p.position_type)
        .collect();
    assert_eq!(types, vec![PositionType::Db, PositionType::Ad, PositionType::Ad]);
}

#[tokio::test]
async fn test_excel_upload_is_parsed_from_first_sheet() {
    let (dir, importer) = create_test_importer(ImportSettings::default()).unwrap();
    let path = dir.path().join("plasmids.xlsx");

    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in ["Plasmid ID", "Plasmid Name", "Type"].iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (col, value) in ["PLS001", "pDONR221", "Entry"].iter().enumerate() {
        sheet.write_string(1, col as u16, *value).unwrap();
    }
    workbook.save(&path).unwrap();

    let report = importer
        .import_file(&path, "plasmid", ImportOptions::default())
        .await;

    assert!(report.success, "{}", report.message);
    assert_eq!(report.counts.plasmids, 1);
    assert_eq!(importer.repository().count_rows(ReagentTable::Plasmid).unwrap(), 1);
}

#[tokio::test]
async fn test_excel_date_cells_are_stored_as_dates() {
    let (dir, importer) = create_test_importer(ImportSettings::default()).unwrap();
    let path = dir.path().join("freezers.xlsx");

    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    let date_format = rust_xlsxwriter::Format::new().set_num_format("yyyy-mm-dd");
    let date = rust_xlsxwriter::ExcelDateTime::from_ymd(2024, 5, 1).unwrap();
    for (col, header) in ["freezer_id", "freezer_location", "freezer_date"].iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    sheet.write_string(1, 0, "FRZ001").unwrap();
    sheet.write_string(1, 1, "Room 1").unwrap();
    sheet
        .write_datetime_with_format(1, 2, &date, &date_format)
        .unwrap();
    workbook.save(&path).unwrap();

    let report = importer
        .import_file(&path, "freezer", ImportOptions::default())
        .await;
    assert!(report.success, "{}", report.message);

    let rows = importer.repository().dump_table(ReagentTable::Freezer).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], vec!["FRZ001", "Room 1", "", "2024-05-01"]);
}
