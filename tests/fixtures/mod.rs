//! Synthetic container builders shared by the integration tests
//!
//! Every builder produces the smallest file its decoder accepts; nothing
//! here depends on files on disk.

#![allow(dead_code)]

/// A complete packet, markers included
pub const XMP: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    <rdf:Description rdf:about=""
      xmlns:xmp="http://ns.adobe.com/xap/1.0/">
      <xmp:CreatorTool>xmpdump fixtures</xmp:CreatorTool>
    </rdf:Description>
  </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#;

/// The packet up to, not including, its end marker
pub fn xmp_without_trailer() -> &'static str {
    let end = XMP.find("<?xpacket end").unwrap();
    &XMP[..end]
}

// InDesign

pub const INDD_PAGE_LENGTH: usize = 4096;

const INDD_MASTER_GUID: [u8; 16] = [
    0x06, 0x06, 0xed, 0xf5, 0xd8, 0x1d, 0x46, 0xe5, 0xbd, 0x31, 0xef, 0xe7, 0xfe, 0x74, 0xb7, 0x1d,
];

const INDD_HEADER_GUID: [u8; 16] = [
    0xde, 0x39, 0x39, 0x79, 0x51, 0x88, 0x4b, 0x6c, 0x8e, 0x63, 0xee, 0xf8, 0xae, 0xe0, 0xdd, 0x38,
];

/// One 4096-byte master page
pub fn indd_master_page(sequence: u64, pages: u32, big_endian: bool) -> Vec<u8> {
    let mut page = vec![0u8; INDD_PAGE_LENGTH];
    page[..16].copy_from_slice(&INDD_MASTER_GUID);
    page[16..24].copy_from_slice(b"DOCUMENT");
    page[24] = if big_endian { 2 } else { 1 };
    page[264..272].copy_from_slice(&sequence.to_le_bytes());
    page[280..284].copy_from_slice(&pages.to_le_bytes());
    page
}

/// Padding, marker, inner length and payload of one contiguous object
pub fn indd_object_with_length(data: &[u8], stream_length: u32, big_endian: bool) -> Vec<u8> {
    let mut out = vec![0u8; 64];
    out.extend_from_slice(&INDD_HEADER_GUID);
    out.extend_from_slice(&7u32.to_le_bytes()); // object UID
    out.extend_from_slice(&1u32.to_le_bytes()); // class ID
    out.extend_from_slice(&stream_length.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // checksum
    let len = data.len() as u32;
    if big_endian {
        out.extend_from_slice(&len.to_be_bytes());
    } else {
        out.extend_from_slice(&len.to_le_bytes());
    }
    out.extend_from_slice(data);
    out
}

/// Object whose two length fields agree
pub fn indd_object(data: &[u8], big_endian: bool) -> Vec<u8> {
    indd_object_with_length(data, data.len() as u32 + 4, big_endian)
}

/// Two master pages padded out to `pages` pages, then the objects
pub fn indd_document(masters: [Vec<u8>; 2], pages: usize, objects: &[Vec<u8>]) -> Vec<u8> {
    let mut data = masters.concat();
    data.resize(pages * INDD_PAGE_LENGTH - 64, 0);
    for object in objects {
        data.extend_from_slice(object);
    }
    data
}

/// Three-page little-endian document holding `xmp` after a short object
pub fn indd_with_xmp(xmp: &str) -> Vec<u8> {
    indd_document(
        [
            indd_master_page(1, 3, false),
            indd_master_page(2, 3, false),
        ],
        3,
        &[indd_object(b"tiny", false), indd_object(xmp.as_bytes(), false)],
    )
}

// PDF

/// Numbered objects, a classic cross-reference table and a trailer
pub fn pdf_document(objects: &[String], eol: &str) -> Vec<u8> {
    let mut out = format!("%PDF-1.4{eol}").into_bytes();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj{eol}{body}{eol}endobj{eol}", i + 1).as_bytes());
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref{eol}0 {}{eol}", objects.len() + 1).as_bytes());
    out.extend_from_slice(format!("0000000000 65535 f{eol}").as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n{eol}", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer{eol}<< /Size {} /Root 1 0 R >>{eol}startxref{eol}{xref_offset}{eol}%%EOF{eol}",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

/// Catalog, metadata stream holding `xmp`, page tree
pub fn pdf_with_xmp(xmp: &str, eol: &str) -> Vec<u8> {
    let objects = vec![
        "<< /Type /Catalog /Pages 3 0 R /Metadata 2 0 R >>".to_string(),
        format!(
            "<< /Type /Metadata /Subtype /XML /Length {} >>{eol}stream{eol}{}{eol}endstream",
            xmp.len(),
            xmp
        ),
        "<< /Type /Pages /Kids [] /Count 0 >>".to_string(),
    ];
    pdf_document(&objects, eol)
}

// PNG

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Length, type, data and a zero CRC
pub fn png_chunk(chunk_type: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = (data.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);
    out.extend_from_slice(&[0, 0, 0, 0]);
    out
}

/// Uncompressed iTXt chunk with the XMP keyword and empty language fields
pub fn png_xmp_chunk(xmp: &str) -> Vec<u8> {
    let mut data = b"XML:com.adobe.xmp\0".to_vec();
    data.extend_from_slice(&[0, 0]); // compression flag, method
    data.push(0); // language tag
    data.push(0); // translated keyword
    data.extend_from_slice(xmp.as_bytes());
    png_chunk(b"iTXt", &data)
}

pub fn png_image(chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = PNG_SIGNATURE.to_vec();
    for chunk in chunks {
        out.extend_from_slice(chunk);
    }
    out
}

/// Signature, IHDR, XMP iTXt, IEND
pub fn png_with_xmp(xmp: &str) -> Vec<u8> {
    png_image(&[
        png_chunk(b"IHDR", &[0; 13]),
        png_xmp_chunk(xmp),
        png_chunk(b"IEND", &[]),
    ])
}

// Photoshop

/// Header, empty color mode data, one XMP image resource
pub fn psd_with_xmp(xmp: &str) -> Vec<u8> {
    let mut psd = b"8BPS".to_vec();
    psd.extend_from_slice(&1u16.to_be_bytes());
    psd.extend_from_slice(&[0; 6]);
    psd.extend_from_slice(&3u16.to_be_bytes());
    psd.extend_from_slice(&16u32.to_be_bytes());
    psd.extend_from_slice(&16u32.to_be_bytes());
    psd.extend_from_slice(&8u16.to_be_bytes());
    psd.extend_from_slice(&3u16.to_be_bytes());
    psd.extend_from_slice(&0u32.to_be_bytes());

    let mut resource = b"8BIM".to_vec();
    resource.extend_from_slice(&1060u16.to_be_bytes());
    resource.extend_from_slice(&[0, 0]); // empty name, padded
    resource.extend_from_slice(&(xmp.len() as u32).to_be_bytes());
    resource.extend_from_slice(xmp.as_bytes());
    if xmp.len() % 2 != 0 {
        resource.push(0);
    }

    psd.extend_from_slice(&(resource.len() as u32).to_be_bytes());
    psd.extend(resource);
    psd
}
