#![cfg(feature = "std")]

use std::io::{self, Read};

use csv::ReaderBuilder as CsvReaderBuilder;
use furrow::{
    avec::{Error, ReaderBuilder},
    sans::{
        Encoding,
        bom::{Bom, BomPolicy},
    },
};

const SAMPLE: &str = "abab,,cdcd,efef\r\nzxcv,asdf,\"qw\"\"er\",";

#[test]
fn example_1() {
    let records = parse_str("abab,cdcd,efef");
    assert_eq!(records, [["abab", "cdcd", "efef"]]);
}

#[test]
fn example_2() {
    let records = parse_str("abab,\"cdcd\",efef");
    assert_eq!(records, [["abab", "cdcd", "efef"]]);
}

#[test]
fn example_3() {
    let records = parse_str("abab,cdcd,efef\nzxcv,asdf,qwer");
    assert_eq!(records, [["abab", "cdcd", "efef"], ["zxcv", "asdf", "qwer"]]);
}

#[test]
fn example_4() {
    let records = parse_str("abab,\"cd,cd\",efef");
    assert_eq!(records, [["abab", "cd,cd", "efef"]]);
}

#[test]
fn example_5() {
    let records = parse_str("abab,cdcd,efef\r\nzxcv,asdf,qwer");
    assert_eq!(records, [["abab", "cdcd", "efef"], ["zxcv", "asdf", "qwer"]]);
}

#[test]
fn example_6() {
    let records = parse_str("abab,\"\"\"cdcd\",efef\r\nzxcv,asdf,qwer");
    assert_eq!(records, [["abab", "\"cdcd", "efef"], ["zxcv", "asdf", "qwer"]]);
}

#[test]
fn example_7() {
    let records = parse_str("abab,cdcd,efef\r\nzxcv,asdf,\"qw\"\"er\"");
    assert_eq!(records, [["abab", "cdcd", "efef"], ["zxcv", "asdf", "qw\"er"]]);
}

#[test]
fn example_8() {
    assert_sample(parse_str(SAMPLE));
}

#[test]
fn example_9() {
    assert_sample(parse_str(&format!("{SAMPLE}\r")));
}

#[test]
fn example_10() {
    assert_sample(parse_str(&format!("{SAMPLE}\r\n")));
}

#[test]
fn example_11() {
    assert_sample(parse_str(&format!("{SAMPLE}\n")));
}

#[test]
fn example_12() {
    let records = parse_str("abab,,\"\rcdcd\n\",efef\r\nzxcv,asdf,\"qw\"\"er\",\n");
    assert_eq!(
        records,
        [
            ["abab", "", "\rcdcd\n", "efef"],
            ["zxcv", "asdf", "qw\"er", ""]
        ]
    );
}

#[test]
fn agrees_with_csv_crate() {
    let inputs = [
        "abab,cdcd,efef",
        "abab,\"cd,cd\",efef",
        "abab,\"\"\"cdcd\",efef\r\nzxcv,asdf,qwer",
        "abab,,cdcd,efef\r\nzxcv,asdf,\"qw\"\"er\",\r\n",
        "abab,,\"\rcdcd\n\",efef\r\nzxcv,asdf,\"qw\"\"er\",\n",
        "a,b\rc,d\ne,f\r\ng,h",
        "\"\",\"\",\n,,\n",
    ];

    for input in inputs {
        let expected: Vec<Vec<String>> = CsvReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(input.as_bytes())
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();

        assert_eq!(parse_str(input), expected, "{input:?}");
    }
}

#[test]
fn encodings_without_bom() {
    let encodings = [
        Encoding::Legacy(encoding_rs::SHIFT_JIS),
        Encoding::Legacy(encoding_rs::EUC_JP),
        Encoding::Utf8,
        Encoding::Utf16Be,
        Encoding::Utf16Le,
        Encoding::Utf32Be,
        Encoding::Utf32Le,
    ];

    for encoding in encodings {
        let records = parse(&encode(SAMPLE, encoding), encoding).unwrap();
        assert_sample(records);

        let text = "名前,値\r\n\"東京,大阪\",１２３\r\n";
        let records = parse(&encode(text, encoding), encoding).unwrap();
        assert_eq!(
            records,
            [["名前", "値"], ["東京,大阪", "１２３"]],
            "{encoding}"
        );
    }
}

#[test]
fn utf8_with_bom() {
    let data = marked(Bom::Utf8, SAMPLE.as_bytes());
    assert_sample(parse(&data, Encoding::Utf8).unwrap());
}

#[test]
fn utf16_with_bom() {
    let data = marked(Bom::Utf16Be, &encode(SAMPLE, Encoding::Utf16Be));
    assert_sample(parse(&data, Encoding::Utf16).unwrap());

    let data = marked(Bom::Utf16Le, &encode(SAMPLE, Encoding::Utf16Le));
    assert_sample(parse(&data, Encoding::Utf16).unwrap());
}

#[test]
fn utf32_with_bom() {
    let data = marked(Bom::Utf32Be, &encode(SAMPLE, Encoding::Utf32Be));
    assert_sample(parse(&data, Encoding::Utf32).unwrap());

    let data = marked(Bom::Utf32Le, &encode(SAMPLE, Encoding::Utf32Le));
    assert_sample(parse(&data, Encoding::Utf32).unwrap());
}

#[test]
fn unordered_utf16_defaults_to_big_endian() {
    let data = encode(SAMPLE, Encoding::Utf16Be);
    assert_sample(parse(&data, Encoding::Utf16).unwrap());
}

#[test]
fn every_mark_is_excluded_from_first_field() {
    for bom in [
        Bom::Utf8,
        Bom::Utf16Be,
        Bom::Utf16Le,
        Bom::Utf32Be,
        Bom::Utf32Le,
    ] {
        let data = marked(bom, &encode("abab,cdcd,efef", bom.encoding()));

        // The mark overrides the declaration, even across families.
        for declared in [Encoding::Utf8, bom.encoding()] {
            let records = parse(&data, declared).unwrap();
            assert_eq!(records, [["abab", "cdcd", "efef"]], "{bom:?} as {declared}");
        }
    }
}

#[test]
fn reports_resolved_encoding() {
    let data = marked(Bom::Utf16Le, &encode("a", Encoding::Utf16Le));
    let reader = ReaderBuilder::new().from_reader(&data[..]).unwrap();
    assert_eq!(reader.encoding(), Encoding::Utf16Le);
    assert_eq!(reader.source().bom(), Some(Bom::Utf16Le));
}

#[test]
fn bom_policy() {
    let marked = marked(Bom::Utf8, b"a,b");

    let result = ReaderBuilder::new()
        .bom(BomPolicy::Forbidden)
        .from_reader(&marked[..]);
    assert!(matches!(
        result,
        Err(Error::UnexpectedByteOrderMark(Bom::Utf8))
    ));

    let result = ReaderBuilder::new()
        .bom(BomPolicy::Required)
        .from_reader(&b"a,b"[..]);
    assert!(matches!(result, Err(Error::MissingByteOrderMark)));

    let mut reader = ReaderBuilder::new()
        .bom(BomPolicy::Required)
        .from_reader(&marked[..])
        .unwrap();
    assert!(reader.advance().unwrap());
    assert_eq!(reader.current().unwrap().to_vec(), ["a", "b"]);
}

#[test]
fn malformed_declaration_fails_construction() {
    let result = ReaderBuilder::new()
        .encoding(Encoding::Legacy(encoding_rs::REPLACEMENT))
        .from_reader(&b"a,b"[..]);
    assert!(matches!(result, Err(Error::MalformedEncodingDeclaration(_))));
}

#[test]
fn encoding_error_halts_reader() {
    let mut reader = ReaderBuilder::new()
        .from_reader(&b"a,b\nc,\xFFd\ne,f\n"[..])
        .unwrap();

    assert!(reader.advance().unwrap());
    assert_eq!(reader.current().unwrap().to_vec(), ["a", "b"]);

    let err = reader.advance().unwrap_err();
    assert!(matches!(err, Error::Encoding { offset: 6, .. }), "{err}");
    assert!(reader.current().is_none());

    assert!(matches!(reader.advance(), Err(Error::Halted)));
}

#[test]
fn io_error_propagates() {
    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::ErrorKind::ConnectionReset.into())
        }
    }

    let result = ReaderBuilder::new().from_reader(Broken);
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn exhaustion_is_stable() {
    let mut reader = ReaderBuilder::new().from_reader(&b"a\n"[..]).unwrap();

    assert!(reader.advance().unwrap());
    for _ in 0..3 {
        assert!(!reader.advance().unwrap());
        assert!(reader.current().is_none());
    }
}

#[test]
fn empty_stream_has_no_records() {
    assert!(parse(b"", Encoding::Utf8).unwrap().is_empty());
    assert!(parse(Bom::Utf8.as_bytes(), Encoding::Utf8).unwrap().is_empty());
}

#[test]
fn reads_incrementally_from_a_slow_stream() {
    /// A reader handing out one byte per call, and logging how far it got.
    struct Slow<'a> {
        data: &'a [u8],
        served: std::rc::Rc<std::cell::Cell<usize>>,
    }

    impl Read for Slow<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let Some((b, rest)) = self.data.split_first() else {
                return Ok(0);
            };
            buf[0] = *b;
            self.data = rest;
            self.served.set(self.served.get() + 1);
            Ok(1)
        }
    }

    let data = b"ab,cd\nef,gh\nij,kl\n";
    let served = std::rc::Rc::default();
    let slow = Slow {
        data,
        served: std::rc::Rc::clone(&served),
    };

    let mut reader = ReaderBuilder::new().from_reader(slow).unwrap();

    assert!(reader.advance().unwrap());
    assert_eq!(reader.current().unwrap().to_vec(), ["ab", "cd"]);
    // Nothing past the first record's terminator has been read.
    assert_eq!(served.get(), 6);

    assert!(reader.advance().unwrap());
    assert_eq!(reader.current().unwrap().to_vec(), ["ef", "gh"]);
    assert_eq!(served.get(), 12);
}

#[test]
fn custom_dialect() {
    let mut reader = ReaderBuilder::new()
        .delimiter('\t')
        .quote('\'')
        .from_reader(&b"a\t'b\tc'\t\"d\"\n"[..])
        .unwrap();

    let records: Vec<_> = reader.records().map(|r| r.unwrap().to_vec()).collect();
    assert_eq!(records, [["a", "b\tc", "\"d\""]]);
}

#[test]
fn lenient_and_strict_quoting() {
    let input = "\"ab\"cd,e\n";

    assert_eq!(parse_str(input), [["abcd", "e"]]);

    let mut reader = ReaderBuilder::new()
        .strict(true)
        .from_reader(input.as_bytes())
        .unwrap();
    let err = reader.advance().unwrap_err();
    assert!(matches!(err, Error::MalformedRecord { record: 1, .. }), "{err}");
}

fn assert_sample(records: Vec<Vec<String>>) {
    assert_eq!(
        records,
        [
            ["abab", "", "cdcd", "efef"],
            ["zxcv", "asdf", "qw\"er", ""]
        ]
    );
}

fn parse_str(input: &str) -> Vec<Vec<String>> {
    parse(input.as_bytes(), Encoding::Utf8).unwrap()
}

fn parse(data: &[u8], encoding: Encoding) -> Result<Vec<Vec<String>>, Error> {
    let mut reader = ReaderBuilder::new().encoding(encoding).from_reader(data)?;

    let mut records = vec![];
    while reader.advance()? {
        records.push(reader.current().unwrap().to_vec());
    }

    Ok(records)
}

fn encode(text: &str, encoding: Encoding) -> Vec<u8> {
    match encoding {
        Encoding::Utf8 => text.as_bytes().to_vec(),
        Encoding::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        Encoding::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        Encoding::Utf32Be => text.chars().flat_map(|c| (c as u32).to_be_bytes()).collect(),
        Encoding::Utf32Le => text.chars().flat_map(|c| (c as u32).to_le_bytes()).collect(),
        Encoding::Legacy(encoding) => {
            let (data, _, unmappable) = encoding.encode(text);
            assert!(!unmappable);
            data.into_owned()
        }
        _ => unreachable!("{encoding} has no fixed byte order"),
    }
}

fn marked(bom: Bom, data: &[u8]) -> Vec<u8> {
    [bom.as_bytes(), data].concat()
}
