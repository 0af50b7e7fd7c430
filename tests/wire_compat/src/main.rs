fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write as _;
    use std::path::PathBuf;

    use base64::{Engine, engine::general_purpose::STANDARD};
    use mailpack_message::{
        FileDescriptor, MailMessage, MessageAssembler, PackageRecord, SubjectTag, SummaryRecord,
        parse_info, parse_subject,
    };
    use mailpack_packaging::{PackageStream, PackageUnit, checksum_bytes};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a committed fixture file as text.
    fn load_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// The descriptor every committed fixture was rendered from.
    fn fixture_descriptor() -> FileDescriptor {
        FileDescriptor {
            file_id: "3f0c9a21-54d8-4b6e-8c11-2f4a7d9e6b05".into(),
            file_name: "vacation-photos.tar".into(),
            total_size: 11_010_048,
            checksum: "0f343b0931126a20f133d67c2b018a3b".into(),
        }
    }

    fn fixture_package() -> PackageRecord {
        PackageRecord {
            index: 2,
            size: 524_288,
            checksum: "5d41402abc4b2a76b9719d911017c592".into(),
        }
    }

    // --- Golden subject lines ---

    #[test]
    fn fixture_single_subject() {
        assert_eq!(
            mailpack_message::compose::single_subject("vacation-photos.tar"),
            load_fixture("single_subject.txt")
        );
    }

    #[test]
    fn fixture_part_subject() {
        assert_eq!(
            mailpack_message::compose::part_subject("vacation-photos.tar", 2),
            load_fixture("part_subject.txt")
        );
    }

    #[test]
    fn fixture_summary_subject() {
        assert_eq!(
            mailpack_message::compose::summary_subject("vacation-photos.tar"),
            load_fixture("sum_subject.txt")
        );
    }

    // --- Golden info bodies ---

    #[test]
    fn fixture_single_body() {
        assert_eq!(
            mailpack_message::compose::single_info(&fixture_descriptor(), ""),
            load_fixture("single_body.txt")
        );
    }

    #[test]
    fn fixture_part_body() {
        assert_eq!(
            mailpack_message::compose::part_info(&fixture_descriptor(), &fixture_package(), ""),
            load_fixture("part_body.txt")
        );
    }

    #[test]
    fn fixture_summary_body() {
        assert_eq!(
            mailpack_message::compose::summary_info(
                &fixture_descriptor(),
                &SummaryRecord { package_count: 3 },
                ""
            ),
            load_fixture("sum_body.txt")
        );
    }

    // --- The receiver side reads the same bytes back ---

    #[test]
    fn fixtures_parse_back_to_their_records() {
        match parse_subject(&load_fixture("part_subject.txt")) {
            Some(SubjectTag::Part { file_name, index }) => {
                assert_eq!(file_name, "vacation-photos.tar");
                assert_eq!(index, 2);
            }
            other => panic!("unexpected tag: {other:?}"),
        }

        let info = parse_info(&load_fixture("part_body.txt")).unwrap();
        assert_eq!(info.file_id, "3f0c9a21-54d8-4b6e-8c11-2f4a7d9e6b05");
        assert_eq!(info.total_size, 11_010_048);
        assert_eq!(info.package, Some(fixture_package()));

        let info = parse_info(&load_fixture("sum_body.txt")).unwrap();
        assert_eq!(info.package_count, Some(3));
        assert!(info.package.is_none());
    }

    // --- MIME structure ---

    #[test]
    fn rendered_messages_carry_no_recipient_headers() {
        let assembler = MessageAssembler::new("sender@example.com", "utf-8");
        let message = assembler.single(&fixture_descriptor(), b"payload".to_vec());
        let rendered = String::from_utf8(message.to_rfc2822()).unwrap();

        assert!(rendered.starts_with("From: sender@example.com\r\n"));
        assert!(rendered.contains("Subject: [GS_SINGLE][Name: vacation-photos.tar]\r\n"));
        assert!(!rendered.contains("\r\nTo:"));
        assert!(!rendered.contains("\r\nCc:"));
        assert!(!rendered.contains("\r\nBcc:"));
    }

    /// Pulls the base64 attachment payload out of a rendered message.
    fn decode_attachment(message: &MailMessage) -> Vec<u8> {
        let text = String::from_utf8(message.to_rfc2822()).unwrap();
        let marker = "Content-Transfer-Encoding: base64";
        let start = text.find(marker).unwrap();
        let encoded_start = text[start..].find("\r\n\r\n").unwrap() + start + 4;
        let encoded_end = text[encoded_start..].find("\r\n--").unwrap() + encoded_start;
        let encoded: String = text[encoded_start..encoded_end]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        STANDARD.decode(encoded).unwrap()
    }

    // --- Whole pipeline: package, render, parse, reassemble ---

    #[test]
    fn split_transfer_survives_the_whole_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.bin");
        let payload: Vec<u8> = (0u32..160_000).map(|i| (i % 241) as u8).collect();
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(&payload).unwrap();
        drop(f);

        let mut stream = PackageStream::open(&path, 65_536).unwrap();
        let descriptor = stream.descriptor().clone();
        assert!(stream.is_split());

        let assembler = MessageAssembler::new("sender@example.com", "utf-8");
        let mut reassembled = Vec::new();
        let mut parts = 0u32;
        let mut summary_count = None;

        while let Some(unit) = stream.next_unit().unwrap() {
            match unit {
                PackageUnit::Part { record, payload } => {
                    let message = assembler.part(&descriptor, &record, payload);

                    // Subject and body agree on the package identity.
                    match parse_subject(&message.subject) {
                        Some(SubjectTag::Part { index, .. }) => assert_eq!(index, record.index),
                        other => panic!("unexpected tag: {other:?}"),
                    }
                    let info = parse_info(&message.body).unwrap();
                    assert_eq!(info.package.as_ref(), Some(&record));
                    assert_eq!(info.file_id, descriptor.file_id);

                    // The transported bytes decode back to the exact chunk.
                    let decoded = decode_attachment(&message);
                    assert_eq!(decoded.len() as u64, record.size);
                    assert_eq!(checksum_bytes(&decoded), record.checksum);

                    assert_eq!(record.index, parts);
                    parts += 1;
                    reassembled.extend_from_slice(&decoded);
                }
                PackageUnit::Summary { record } => {
                    let message = assembler.summary(&descriptor, &record);
                    let info = parse_info(&message.body).unwrap();
                    summary_count = info.package_count;
                }
                PackageUnit::Single { .. } => panic!("file above the limit must split"),
            }
        }

        assert_eq!(parts, 3);
        assert_eq!(summary_count, Some(3));
        assert_eq!(reassembled, payload);
        assert_eq!(checksum_bytes(&reassembled), descriptor.checksum);
    }

    #[test]
    fn single_transfer_survives_the_whole_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        fs::write(&path, b"short enough for one message").unwrap();

        let mut stream = PackageStream::open(&path, 65_536).unwrap();
        let descriptor = stream.descriptor().clone();
        assert!(!stream.is_split());

        let assembler = MessageAssembler::new("sender@example.com", "utf-8");
        match stream.next_unit().unwrap() {
            Some(PackageUnit::Single { payload }) => {
                let message = assembler.single(&descriptor, payload);
                match parse_subject(&message.subject) {
                    Some(SubjectTag::Single { file_name }) => assert_eq!(file_name, "note.txt"),
                    other => panic!("unexpected tag: {other:?}"),
                }
                let info = parse_info(&message.body).unwrap();
                assert_eq!(info.checksum, descriptor.checksum);

                let decoded = decode_attachment(&message);
                assert_eq!(decoded, b"short enough for one message");
            }
            other => panic!("expected a single package, got {other:?}"),
        }
        assert!(stream.next_unit().unwrap().is_none());
    }
}
