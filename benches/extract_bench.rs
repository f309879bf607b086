use std::path::Path;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use conciliador::cfdi::{SourceContext, extract_invoice};
use conciliador::core::RunConfig;

fn ctx() -> SourceContext<'static> {
    SourceContext {
        employee: "Ana",
        source_month: "Enero",
        source_path: Path::new("2026/Enero/Ana/f.xml"),
    }
}

fn build_invoice(lines: usize) -> String {
    let mut conceptos = String::new();
    for i in 1..=lines {
        conceptos.push_str(&format!(
            r#"<cfdi:Concepto ClaveProdServ="90101500" Cantidad="1" Descripcion="Consumo {i}" Importe="100.00"/>"#
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/4" Version="4.0"
    Fecha="2026-01-15T10:30:00" Serie="A" Folio="1234"
    SubTotal="{subtotal}.00" Total="{total}.00">
  <cfdi:Emisor Rfc="PRO990101AAA" Nombre="Proveedor SA de CV"/>
  <cfdi:Receptor Rfc="MES2301274X9" Nombre="Mi Empresa" UsoCFDI="G03"/>
  <cfdi:Conceptos>{conceptos}</cfdi:Conceptos>
  <cfdi:Impuestos TotalImpuestosTrasladados="16.00">
    <cfdi:Traslados>
      <cfdi:Traslado Base="100.00" Impuesto="002" TipoFactor="Tasa" TasaOCuota="0.160000" Importe="16.00"/>
      <cfdi:Traslado Base="100.00" Impuesto="003" TipoFactor="Tasa" TasaOCuota="0.080000" Importe="8.00"/>
    </cfdi:Traslados>
  </cfdi:Impuestos>
  <cfdi:Complemento>
    <tfd:TimbreFiscalDigital xmlns:tfd="http://www.sat.gob.mx/TimbreFiscalDigital"
        Version="1.1" UUID="a1b2c3d4-e5f6-7890-abcd-ef1234567890"/>
  </cfdi:Complemento>
</cfdi:Comprobante>"#,
        subtotal = lines * 100,
        total = lines * 100 + 24,
    )
}

fn bench_extract(c: &mut Criterion) {
    let config = RunConfig::default();
    let small = build_invoice(1);
    let large = build_invoice(100);

    c.bench_function("extract_1_line", |b| {
        b.iter(|| extract_invoice(black_box(&small), ctx(), &config).unwrap())
    });

    c.bench_function("extract_100_lines", |b| {
        b.iter(|| extract_invoice(black_box(&large), ctx(), &config).unwrap())
    });
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
