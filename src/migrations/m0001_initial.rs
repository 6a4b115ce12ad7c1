use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0001_initial_schema")
        .operation(
            CreateTable::new("profiles")
                .add_field(Field::new("id", FieldType::Text).primary_key())
                .add_field(Field::new("first_name", FieldType::Text))
                .add_field(Field::new("last_name", FieldType::Text))
                .add_field(Field::new("nip", FieldType::Text))
                .add_field(Field::new("jabatan", FieldType::Text))
                .add_field(Field::new("bidang", FieldType::Text))
                .add_field(Field::new("updated_at", FieldType::Text).not_null()),
        )
        .operation(
            CreateTable::new("spj")
                .add_field(Field::new("id", FieldType::Text).primary_key())
                .add_field(Field::new("nomor_pembukuan", FieldType::Text).not_null())
                .add_field(Field::new("kode_rekening", FieldType::Text).not_null())
                .add_field(Field::new("jenis_spj", FieldType::Text).not_null())
                .add_field(Field::new("bidang", FieldType::Text))
                .add_field(Field::new("tanggal", FieldType::Text).not_null())
                .add_field(Field::new("uraian", FieldType::Text).not_null())
                .add_field(Field::new("jumlah", FieldType::Integer).not_null())
                .add_field(Field::new("file_url", FieldType::Text))
                .add_field(Field::new("created_at", FieldType::Text).not_null())
                .add_field(Field::new("updated_at", FieldType::Text).not_null()),
        )
        // Listing is always ordered by date and usually scoped to a division
        .operation(AddIndex::new("spj", Index::new("idx_spj_tanggal").column_desc("tanggal")))
        .operation(AddIndex::new("spj", Index::new("idx_spj_bidang_tanggal").column("bidang").column_desc("tanggal")))
        .operation(AddIndex::new("spj", Index::new("idx_spj_with_file").column("tanggal").filter("file_url IS NOT NULL")))
}
