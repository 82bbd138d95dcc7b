use mbmaster_core::encoding::{ByteReader, ByteWriter};
use mbmaster_core::frame;
use mbmaster_core::pdu::{
    ExceptionCode, ReadCoilsRequest, ReadHoldingRegistersRequest, Request, Response,
    WriteSingleCoilRequest, WriteSingleRegisterRequest,
};
use mbmaster_core::DecodeError;

const TCP_READ_HOLDING: &[u8] = &[
    0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x6B, 0x00, 0x03,
];
const READ_HOLDING_RESP: &[u8] = &[0x03, 0x06, 0x02, 0x2B, 0x00, 0x00, 0x00, 0x64];

#[test]
fn every_request_encodes_to_a_twelve_byte_frame() {
    let requests = [
        Request::ReadCoils(ReadCoilsRequest {
            start_address: 0,
            quantity: 8,
        }),
        Request::ReadHoldingRegisters(ReadHoldingRegistersRequest {
            start_address: 0,
            quantity: 1,
        }),
        Request::WriteSingleCoil(WriteSingleCoilRequest {
            address: 4,
            value: true,
        }),
        Request::WriteSingleRegister(WriteSingleRegisterRequest {
            address: 4,
            value: 0x1234,
        }),
    ];

    for (i, request) in requests.iter().enumerate() {
        let transaction_id = 0x1000 + i as u16;
        let mut buf = [0u8; 16];
        let mut w = ByteWriter::new(&mut buf);
        frame::encode_request(&mut w, transaction_id, 1, request).unwrap();

        let written = w.as_written();
        assert_eq!(written.len(), 12);
        assert_eq!(
            u16::from_be_bytes([written[0], written[1]]),
            transaction_id
        );
        assert_eq!(&written[2..4], &[0x00, 0x00]);
        assert_eq!(&written[4..6], &[0x00, 0x06]);
    }
}

#[test]
fn fc03_request_golden_frame() {
    let request = Request::ReadHoldingRegisters(ReadHoldingRegistersRequest {
        start_address: 0x006B,
        quantity: 0x0003,
    });

    let mut buf = [0u8; 16];
    let mut w = ByteWriter::new(&mut buf);
    frame::encode_request(&mut w, 1, 1, &request).unwrap();
    assert_eq!(w.as_written(), TCP_READ_HOLDING);
}

#[test]
fn fc03_response_decode_and_helpers() {
    let mut r = ByteReader::new(READ_HOLDING_RESP);
    let response = Response::decode(&mut r).unwrap();

    match response {
        Response::ReadHoldingRegisters(resp) => {
            assert_eq!(resp.register_count(), 3);
            assert_eq!(resp.register(0), Some(0x022B));
            assert_eq!(resp.register(1), Some(0x0000));
            assert_eq!(resp.register(2), Some(0x0064));
        }
        _ => panic!("expected read holding registers response"),
    }
}

#[test]
fn register_payload_decodes_forty_two() {
    let mut r = ByteReader::new(&[0x03, 0x02, 0x00, 0x2A]);
    match Response::decode(&mut r).unwrap() {
        Response::ReadHoldingRegisters(resp) => assert_eq!(resp.register(0), Some(42)),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn crafted_coil_payload_sets_bits_one_and_two() {
    let mut r = ByteReader::new(&[0x01, 0x01, 0b0000_0110]);
    match Response::decode(&mut r).unwrap() {
        Response::ReadCoils(resp) => {
            assert_eq!(resp.coil(0), Some(false));
            assert_eq!(resp.coil(1), Some(true));
            assert_eq!(resp.coil(2), Some(true));
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn header_rejects_short_input_and_zero_length() {
    let mut short = ByteReader::new(&[0x00, 0x01, 0x00]);
    assert_eq!(
        frame::MbapHeader::decode(&mut short).unwrap_err(),
        DecodeError::UnexpectedEof
    );

    let zero_length = [0x00u8, 0x01, 0x00, 0x00, 0x00, 0x00, 0x01];
    let mut r = ByteReader::new(&zero_length);
    assert_eq!(
        frame::MbapHeader::decode(&mut r).unwrap_err(),
        DecodeError::InvalidLength
    );
}

#[test]
fn exception_function_bytes_map_to_their_codes() {
    for (raw, expected) in [
        (0x81u8, 0x01u8),
        (0x83, 0x03),
        (0x85, 0x05),
        (0x86, 0x06),
    ] {
        let bytes = [raw, expected];
        let mut r = ByteReader::new(&bytes);
        match Response::decode(&mut r).unwrap() {
            Response::Exception(ex) => {
                assert_eq!(ex.function_code, raw - 128);
                assert_eq!(ex.exception_code.as_u8(), expected);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    let mut r = ByteReader::new(&[0x83, 0x0B]);
    match Response::decode(&mut r).unwrap() {
        Response::Exception(ex) => assert_eq!(
            ex.exception_code,
            ExceptionCode::GatewayTargetFailedToRespond
        ),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn exception_roundtrip() {
    let bytes = [0x83u8, 0x02];
    let mut r = ByteReader::new(&bytes);
    let decoded = Response::decode(&mut r).unwrap();

    let mut out = [0u8; 8];
    let mut w = ByteWriter::new(&mut out);
    decoded.encode(&mut w).unwrap();
    assert_eq!(w.as_written(), &bytes);
}
